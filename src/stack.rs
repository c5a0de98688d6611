use std::time::{Duration, Instant};

use crate::models::Task;

/// Length of the card rotation; the slots change only once it has elapsed.
pub const ROTATION_DELAY: Duration = Duration::from_millis(500);
pub const UNTITLED: &str = "(untitled)";

/// The four card positions, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Invisible,
    AboveMain,
    Main,
    BelowMain,
}

impl Slot {
    pub const ALL: [Slot; 4] = [Slot::Invisible, Slot::AboveMain, Slot::Main, Slot::BelowMain];

    fn index(self) -> usize {
        match self {
            Slot::Invisible => 0,
            Slot::AboveMain => 1,
            Slot::Main => 2,
            Slot::BelowMain => 3,
        }
    }
}

/// What a card shows. The task id travels with the title so the host can find
/// the task behind a card even when titles repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotEntry {
    pub task_id: Option<String>,
    pub title: String,
}

impl SlotEntry {
    pub fn message(text: &str) -> Self {
        SlotEntry {
            task_id: None,
            title: text.to_string(),
        }
    }
}

/// The rendered cards. The stack reads the current task back from here, so
/// whatever the surface shows is authoritative.
pub trait SlotSurface {
    fn entry(&self, slot: Slot) -> &SlotEntry;
    fn set_entry(&mut self, slot: Slot, entry: SlotEntry);
}

#[derive(Debug, Clone, Default)]
pub struct SlotBoard {
    entries: [SlotEntry; 4],
}

impl SlotSurface for SlotBoard {
    fn entry(&self, slot: Slot) -> &SlotEntry {
        &self.entries[slot.index()]
    }

    fn set_entry(&mut self, slot: Slot, entry: SlotEntry) {
        self.entries[slot.index()] = entry;
    }
}

/// Anything that can be put on a card.
pub trait StackItem {
    fn stack_id(&self) -> Option<&str>;
    fn stack_title(&self) -> Option<&str>;
}

impl StackItem for Task {
    fn stack_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn stack_title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

/// Fired whenever the Main card may have changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainChanged {
    pub task_id: Option<String>,
    pub title: String,
}

pub struct TaskStack<S: SlotSurface = SlotBoard> {
    surface: S,
    titles: Vec<SlotEntry>,
    invisible_index: usize,
    rotation_started: Option<Instant>,
}

impl TaskStack<SlotBoard> {
    pub fn new() -> Self {
        Self::with_surface(SlotBoard::default())
    }
}

impl Default for TaskStack<SlotBoard> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SlotSurface> TaskStack<S> {
    pub fn with_surface(surface: S) -> Self {
        TaskStack {
            surface,
            titles: Vec::new(),
            invisible_index: 0,
            rotation_started: None,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    fn put(&mut self, slot: Slot, index: usize) {
        let entry = self.titles[index].clone();
        self.surface.set_entry(slot, entry);
    }

    // Fewer than four tasks still fill every card, repeating the first one.
    fn sync_initial_positions(&mut self) {
        if self.titles.is_empty() {
            return;
        }

        for slot in Slot::ALL {
            self.put(slot, 0);
        }
        self.invisible_index = 0;

        if self.titles.len() >= 2 {
            self.put(Slot::BelowMain, 0);
            self.put(Slot::Main, 1);
            self.put(Slot::AboveMain, 0);
        }

        if self.titles.len() >= 3 {
            self.put(Slot::Invisible, 0);
            self.put(Slot::AboveMain, 2);
        }

        if self.titles.len() >= 4 {
            self.put(Slot::Invisible, 3);
            self.invisible_index = 3;
        }
    }

    /// Replaces the stack contents and reseeds every card. A rotation in
    /// flight is abandoned.
    pub fn set_tasks<T: StackItem>(&mut self, tasks: &[T]) -> MainChanged {
        self.titles = tasks
            .iter()
            .map(|task| SlotEntry {
                task_id: task.stack_id().map(str::to_string),
                title: match task.stack_title() {
                    Some(title) if !title.is_empty() => title.to_string(),
                    _ => UNTITLED.to_string(),
                },
            })
            .collect();
        self.invisible_index = 0;
        self.rotation_started = None;
        self.sync_initial_positions();
        log::debug!("task stack reseeded with {} titles", self.titles.len());
        self.main_changed()
    }

    /// Begins a rotation. Returns false when one is already running or the
    /// stack is empty.
    pub fn animate_to_next(&mut self, now: Instant) -> bool {
        if self.rotation_started.is_some() || self.titles.is_empty() {
            return false;
        }
        self.rotation_started = Some(now);

        if self.titles.len() > 2 {
            self.invisible_index = (self.invisible_index + 1) % self.titles.len();
        }
        true
    }

    /// Completes the rotation once [`ROTATION_DELAY`] has passed.
    pub fn tick(&mut self, now: Instant) -> Option<MainChanged> {
        let started = self.rotation_started?;
        if now.saturating_duration_since(started) < ROTATION_DELAY {
            return None;
        }
        Some(self.finish_rotation())
    }

    fn finish_rotation(&mut self) -> MainChanged {
        let old_main = self.surface.entry(Slot::Main).clone();
        let old_above = self.surface.entry(Slot::AboveMain).clone();
        let old_invisible = self.surface.entry(Slot::Invisible).clone();

        self.surface.set_entry(Slot::BelowMain, old_main.clone());
        self.surface.set_entry(Slot::Main, old_above);
        self.surface.set_entry(Slot::AboveMain, old_invisible);

        if self.titles.len() > 2 {
            self.put(Slot::Invisible, self.invisible_index);
        } else {
            // with two titles or fewer the old main just cycles back in
            self.surface.set_entry(Slot::Invisible, old_main);
        }

        self.rotation_started = None;
        self.main_changed()
    }

    fn main_changed(&self) -> MainChanged {
        let main = self.surface.entry(Slot::Main);
        MainChanged {
            task_id: main.task_id.clone(),
            title: main.title.clone(),
        }
    }

    /// Overwrites the Main card with a message that belongs to no task.
    pub fn show_message(&mut self, text: &str) {
        self.surface.set_entry(Slot::Main, SlotEntry::message(text));
    }

    pub fn current_title(&self) -> &str {
        &self.surface.entry(Slot::Main).title
    }

    pub fn current_task_id(&self) -> Option<&str> {
        self.surface.entry(Slot::Main).task_id.as_deref()
    }

    pub fn is_animating(&self) -> bool {
        self.rotation_started.is_some()
    }

    /// How far the running rotation has progressed, in `0.0..=1.0`.
    pub fn rotation_progress(&self, now: Instant) -> Option<f64> {
        let started = self.rotation_started?;
        let elapsed = now.saturating_duration_since(started).as_secs_f64();
        Some((elapsed / ROTATION_DELAY.as_secs_f64()).min(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Item(&'static str, Option<&'static str>);

    impl StackItem for Item {
        fn stack_id(&self) -> Option<&str> {
            Some(self.0)
        }

        fn stack_title(&self) -> Option<&str> {
            self.1
        }
    }

    fn items(titles: &[&'static str]) -> Vec<Item> {
        titles.iter().map(|t| Item(*t, Some(*t))).collect()
    }

    fn slots(stack: &TaskStack) -> [String; 4] {
        Slot::ALL.map(|slot| stack.surface().entry(slot).title.clone())
    }

    fn rotate(stack: &mut TaskStack, now: &mut Instant) -> MainChanged {
        assert!(stack.animate_to_next(*now));
        *now += ROTATION_DELAY;
        stack.tick(*now).expect("rotation completes after the delay")
    }

    #[test]
    fn test_seeding_empty_leaves_slots_untouched() {
        let mut stack = TaskStack::new();
        stack.show_message("No tasks found.");
        let changed = stack.set_tasks::<Item>(&[]);
        assert_eq!(changed.title, "No tasks found.");
        assert_eq!(stack.current_title(), "No tasks found.");
        assert_eq!(slots(&stack)[0], "");
    }

    #[test]
    fn test_seeding_tiers() {
        let mut stack = TaskStack::new();

        stack.set_tasks(&items(&["A"]));
        assert_eq!(slots(&stack), ["A", "A", "A", "A"]);

        stack.set_tasks(&items(&["A", "B"]));
        assert_eq!(slots(&stack), ["A", "A", "B", "A"]);

        stack.set_tasks(&items(&["A", "B", "C"]));
        assert_eq!(slots(&stack), ["A", "C", "B", "A"]);
        assert_eq!(stack.invisible_index, 0);

        stack.set_tasks(&items(&["A", "B", "C", "D"]));
        assert_eq!(slots(&stack), ["D", "C", "B", "A"]);
        assert_eq!(stack.invisible_index, 3);

        stack.set_tasks(&items(&["A", "B", "C", "D", "E"]));
        assert_eq!(slots(&stack), ["D", "C", "B", "A"]);
        assert_eq!(stack.invisible_index, 3);
    }

    #[test]
    fn test_missing_titles_get_placeholder() {
        let mut stack = TaskStack::new();
        let changed = stack.set_tasks(&[Item("a", None), Item("b", Some(""))]);
        assert_eq!(changed.title, UNTITLED);
        assert_eq!(changed.task_id.as_deref(), Some("b"));
    }

    #[test]
    fn test_main_changed_carries_task_identity() {
        let mut stack = TaskStack::new();
        let tasks = vec![Item("first", Some("Same")), Item("second", Some("Same"))];
        let changed = stack.set_tasks(&tasks);
        assert_eq!(changed.title, "Same");
        assert_eq!(changed.task_id.as_deref(), Some("second"));
        assert_eq!(stack.current_task_id(), Some("second"));
    }

    #[test]
    fn test_animate_is_not_reentrant() {
        let mut stack = TaskStack::new();
        stack.set_tasks(&items(&["A", "B", "C", "D"]));
        let t0 = Instant::now();

        assert!(stack.animate_to_next(t0));
        assert!(stack.is_animating());
        let index = stack.invisible_index;
        let before = slots(&stack);

        assert!(!stack.animate_to_next(t0 + Duration::from_millis(100)));
        assert_eq!(stack.invisible_index, index);
        assert_eq!(slots(&stack), before);
    }

    #[test]
    fn test_animate_on_empty_stack_is_noop() {
        let mut stack = TaskStack::new();
        assert!(!stack.animate_to_next(Instant::now()));
        assert!(!stack.is_animating());
    }

    #[test]
    fn test_slots_change_only_after_delay() {
        let mut stack = TaskStack::new();
        stack.set_tasks(&items(&["A", "B", "C"]));
        let t0 = Instant::now();
        stack.animate_to_next(t0);

        assert_eq!(stack.tick(t0 + Duration::from_millis(499)), None);
        assert_eq!(stack.current_title(), "B");
        assert_eq!(stack.rotation_progress(t0 + Duration::from_millis(250)), Some(0.5));

        let changed = stack.tick(t0 + ROTATION_DELAY).expect("rotation done");
        assert_eq!(changed.title, "C");
        assert!(!stack.is_animating());
        assert_eq!(stack.tick(t0 + Duration::from_secs(5)), None);
    }

    #[test]
    fn test_three_tasks_cycle_through_main() {
        let mut stack = TaskStack::new();
        stack.set_tasks(&items(&["A", "B", "C"]));
        let mut now = Instant::now();

        let mut seen = vec![stack.current_title().to_string()];
        for _ in 0..3 {
            seen.push(rotate(&mut stack, &mut now).title);
        }

        assert_eq!(seen, ["B", "C", "A", "B"]);
        assert_eq!(slots(&stack), ["A", "C", "B", "A"]);
    }

    #[test]
    fn test_four_tasks_cycle_with_wrap() {
        let mut stack = TaskStack::new();
        stack.set_tasks(&items(&["A", "B", "C", "D"]));
        let mut now = Instant::now();

        let mains: Vec<String> = (0..4).map(|_| rotate(&mut stack, &mut now).title).collect();
        assert_eq!(mains, ["C", "D", "A", "B"]);
        assert!(stack.invisible_index < 4);
    }

    #[test]
    fn test_two_tasks_reuse_old_main_as_invisible() {
        let mut stack = TaskStack::new();
        stack.set_tasks(&items(&["A", "B"]));
        let mut now = Instant::now();

        let changed = rotate(&mut stack, &mut now);
        assert_eq!(changed.title, "A");
        assert_eq!(slots(&stack), ["B", "A", "A", "B"]);

        let mains: Vec<String> = (0..3).map(|_| rotate(&mut stack, &mut now).title).collect();
        assert_eq!(mains, ["A", "B", "A"]);
    }

    #[test]
    fn test_single_task_stays_on_main() {
        let mut stack = TaskStack::new();
        stack.set_tasks(&items(&["Solo"]));
        let mut now = Instant::now();
        assert_eq!(rotate(&mut stack, &mut now).title, "Solo");
        assert_eq!(slots(&stack), ["Solo", "Solo", "Solo", "Solo"]);
    }

    #[test]
    fn test_set_tasks_abandons_rotation() {
        let mut stack = TaskStack::new();
        stack.set_tasks(&items(&["A", "B", "C"]));
        let t0 = Instant::now();
        stack.animate_to_next(t0);

        stack.set_tasks(&items(&["X", "Y"]));
        assert!(!stack.is_animating());
        assert_eq!(stack.tick(t0 + ROTATION_DELAY), None);
        assert_eq!(stack.current_title(), "Y");
    }
}
