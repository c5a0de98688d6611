use std::time::{Duration, Instant};

use crate::arc::{ArcConfig, ArcTimer, TimerEvent};
use crate::models::Task;
use crate::stack::{MainChanged, TaskStack};

pub const REVEAL_DURATION: Duration = Duration::from_millis(500);
pub const NO_TASKS_MESSAGE: &str = "No tasks found.";
pub const ALL_DONE_MESSAGE: &str = "All tasks completed.";

/// Store writes requested by the home screen. The caller performs them and
/// reports back through [`HomeController::remaining_saved`] and
/// [`HomeController::completion_saved`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SaveRemaining { task_id: String, seconds: i64 },
    MarkCompleted { task_id: String },
}

/// Home screen state: the active tasks, the card stack and the dial.
///
/// Everything here runs on the UI thread and is driven by [`HomeController::tick`].
pub struct HomeController {
    tasks: Vec<Task>,
    stack: TaskStack,
    timer: ArcTimer,
    autosave_every: Duration,
    last_autosave: Option<Instant>,
}

impl HomeController {
    pub fn new(arc: ArcConfig, autosave_every: Duration) -> Self {
        HomeController {
            tasks: Vec::new(),
            stack: TaskStack::new(),
            timer: ArcTimer::new(arc),
            autosave_every,
            last_autosave: None,
        }
    }

    pub fn stack(&self) -> &TaskStack {
        &self.stack
    }

    pub fn timer(&self) -> &ArcTimer {
        &self.timer
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    /// The task behind the Main card, found by id.
    pub fn current_task(&self) -> Option<&Task> {
        let id = self.stack.current_task_id()?;
        self.tasks.iter().find(|task| task.id.as_deref() == Some(id))
    }

    fn current_task_id(&self) -> Option<String> {
        self.current_task().and_then(|task| task.id.clone())
    }

    /// Replaces the task list with the active subset of `tasks`.
    pub fn load(&mut self, tasks: Vec<Task>, now: Instant) {
        self.tasks = tasks.into_iter().filter(|task| !task.is_completed).collect();
        self.last_autosave = None;

        if self.tasks.is_empty() {
            self.stack.set_tasks::<Task>(&[]);
            self.stack.show_message(NO_TASKS_MESSAGE);
            self.timer.show_finished();
            return;
        }

        let changed = self.stack.set_tasks(&self.tasks);
        self.on_main_changed(changed, now);
    }

    fn on_main_changed(&mut self, changed: MainChanged, now: Instant) {
        log::debug!("main card is now '{}'", changed.title);
        self.timer.pause();
        self.setup_timer_for_current_task();
        self.timer.reveal(now, REVEAL_DURATION);
    }

    fn setup_timer_for_current_task(&mut self) {
        let (remaining, duration) = match self.current_task() {
            Some(task) => (task.remaining(), task.duration()),
            None => (0, 0),
        };
        self.timer.set_task(remaining, Some(duration));
    }

    /// Rotates to the next card. Ignored with no tasks or mid-rotation.
    pub fn next(&mut self, now: Instant) -> bool {
        if self.tasks.is_empty() {
            return false;
        }
        self.stack.animate_to_next(now)
    }

    /// Start/pause. Pausing asks for the remaining time to be saved.
    pub fn toggle(&mut self, now: Instant) -> Option<Effect> {
        if self.tasks.is_empty() {
            return None;
        }

        if self.timer.is_running() {
            self.timer.pause();
            return self.save_effect();
        }

        self.timer.start(now);
        if self.timer.is_running() {
            self.last_autosave = Some(now);
        }
        None
    }

    fn save_effect(&self) -> Option<Effect> {
        Some(Effect::SaveRemaining {
            task_id: self.current_task_id()?,
            seconds: self.timer.remaining_seconds(),
        })
    }

    pub fn tick(&mut self, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();

        if let Some(changed) = self.stack.tick(now) {
            self.on_main_changed(changed, now);
        }

        if let Some(TimerEvent::Completed) = self.timer.tick(now) {
            match self.current_task_id() {
                Some(task_id) => effects.push(Effect::MarkCompleted { task_id }),
                None => log::warn!("timer completed with no task on the main card"),
            }
        }

        if self.timer.is_running() {
            let due = self
                .last_autosave
                .map_or(true, |last| now.saturating_duration_since(last) >= self.autosave_every);
            if due {
                self.last_autosave = Some(now);
                effects.extend(self.save_effect());
            }
        }

        effects
    }

    /// The store accepted a remaining-time save.
    pub fn remaining_saved(&mut self, task_id: &str, seconds: i64) {
        if let Some(task) = self
            .tasks
            .iter_mut()
            .find(|task| task.id.as_deref() == Some(task_id))
        {
            task.remaining_seconds = Some(seconds);
        }
    }

    /// The store marked a task completed: drop it and reseed the stack.
    pub fn completion_saved(&mut self, task_id: &str, now: Instant) {
        self.tasks.retain(|task| task.id.as_deref() != Some(task_id));

        if self.tasks.is_empty() {
            self.stack.set_tasks::<Task>(&[]);
            self.stack.show_message(ALL_DONE_MESSAGE);
            self.timer.show_finished();
            return;
        }

        let changed = self.stack.set_tasks(&self.tasks);
        self.on_main_changed(changed, now);
    }
}
