use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle, Points},
        Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs,
    },
    Frame, Terminal,
};
use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::config::AppConfig;
use crate::form::{AddTaskForm, FormField, LineInput};
use crate::home::{Effect, HomeController};
use crate::models::{PopupMode, Task, TaskPatch};
use crate::stack::{Slot, SlotSurface};
use crate::tasks_api::{ApiError, TasksApi};
use crate::time::{format_duration, format_time};

const FRAME_INTERVAL: Duration = Duration::from_millis(33);
const TAB_TITLES: [&str; 3] = ["Home", "Tasks", "History"];
const ARC_SAMPLES: usize = 240;

/// Results of store calls, delivered back to the UI thread.
enum ApiEvent {
    Loaded(Result<Vec<Task>, ApiError>),
    RemainingSaved {
        task_id: String,
        seconds: i64,
        result: Result<(), ApiError>,
    },
    CompletionSaved {
        task_id: String,
        result: Result<(), ApiError>,
    },
    Changed {
        what: String,
        result: Result<(), ApiError>,
    },
}

pub struct App {
    api: TasksApi,
    username: String,
    handle: Handle,
    tx: UnboundedSender<ApiEvent>,
    rx: UnboundedReceiver<ApiEvent>,
    pub home: HomeController,
    /// Remaining times sent to the store but not yet acknowledged.
    pending_saves: HashMap<String, i64>,
    pub all_tasks: Vec<Task>,
    pub current_tab: usize,
    pub task_list_state: ListState,
    pub history_list_state: ListState,
    pub popup_mode: PopupMode,
    pub form: AddTaskForm,
    pub status: String,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: &AppConfig, api: TasksApi, username: String, handle: Handle) -> Self {
        let (tx, rx) = unbounded_channel();
        let mut app = App {
            api,
            username,
            handle,
            tx,
            rx,
            home: HomeController::new(config.arc, config.autosave),
            pending_saves: HashMap::new(),
            all_tasks: Vec::new(),
            current_tab: 0,
            task_list_state: ListState::default(),
            history_list_state: ListState::default(),
            popup_mode: PopupMode::None,
            form: AddTaskForm::default(),
            status: String::from("Loading tasks..."),
            should_quit: false,
        };
        app.reload(Instant::now());
        app
    }

    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ApiEvent> + Send + 'static,
    {
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            if tx.send(fut.await).is_err() {
                log::debug!("ui closed before a store call finished");
            }
        });
    }

    /// Refetches every task. A running timer is paused and saved first.
    pub fn reload(&mut self, now: Instant) {
        if self.home.is_running() {
            if let Some(effect) = self.home.toggle(now) {
                self.dispatch(effect);
            }
        }
        let api = self.api.clone();
        let username = self.username.clone();
        self.spawn(async move { ApiEvent::Loaded(api.get_tasks(&username, None).await) });
    }

    pub fn dispatch(&mut self, effect: Effect) {
        let api = self.api.clone();
        let username = self.username.clone();
        match effect {
            Effect::SaveRemaining { task_id, seconds } => {
                self.pending_saves.insert(task_id.clone(), seconds);
                self.spawn(async move {
                    let result = api
                        .update_task(&username, &task_id, &TaskPatch::remaining(seconds))
                        .await;
                    ApiEvent::RemainingSaved {
                        task_id,
                        seconds,
                        result,
                    }
                });
            }
            Effect::MarkCompleted { task_id } => {
                self.spawn(async move {
                    let result = api
                        .update_task(&username, &task_id, &TaskPatch::completed())
                        .await;
                    ApiEvent::CompletionSaved { task_id, result }
                });
            }
        }
    }

    fn change(&self, what: String, task_id: String, patch: Option<TaskPatch>) {
        let api = self.api.clone();
        let username = self.username.clone();
        self.spawn(async move {
            let result = match patch {
                Some(patch) => api.update_task(&username, &task_id, &patch).await,
                None => api.delete_task(&username, &task_id).await,
            };
            ApiEvent::Changed { what, result }
        });
    }

    fn handle_event(&mut self, event: ApiEvent, now: Instant) {
        match event {
            ApiEvent::Loaded(Ok(mut tasks)) => {
                self.status = format!("{} tasks loaded for {}", tasks.len(), self.username);
                // the store may answer before an in-flight save lands
                for task in tasks.iter_mut() {
                    if let Some(secs) = task.id.as_deref().and_then(|id| self.pending_saves.get(id)) {
                        task.remaining_seconds = Some(*secs);
                    }
                }
                self.all_tasks = tasks.clone();
                if !self.home.is_running() {
                    self.home.load(tasks, now);
                }
                let active = self.active_tasks().len();
                let completed = self.completed_tasks().len();
                clamp_selection(&mut self.task_list_state, active);
                clamp_selection(&mut self.history_list_state, completed);
            }
            ApiEvent::Loaded(Err(e)) => {
                log::error!("failed to load tasks: {}", e);
                self.status = format!("Error: {}", e);
            }
            ApiEvent::RemainingSaved {
                task_id,
                seconds,
                result,
            } => {
                if self.pending_saves.get(&task_id) == Some(&seconds) {
                    self.pending_saves.remove(&task_id);
                }
                match result {
                    Ok(()) => {
                        self.home.remaining_saved(&task_id, seconds);
                        if let Some(task) = self.find_task_mut(&task_id) {
                            task.remaining_seconds = Some(seconds);
                        }
                    }
                    Err(e) => {
                        log::error!("error saving timer state: {}", e);
                        self.status = format!("Error saving timer: {}", e);
                    }
                }
            }
            ApiEvent::CompletionSaved { task_id, result } => match result {
                Ok(()) => {
                    self.pending_saves.remove(&task_id);
                    if let Some(task) = self.find_task_mut(&task_id) {
                        task.is_completed = true;
                        task.remaining_seconds = Some(0);
                    }
                    self.home.completion_saved(&task_id, now);
                    self.status = String::from("Task completed");
                }
                Err(e) => {
                    log::error!("failed to mark task completed: {}", e);
                    self.status = format!("Error completing task: {}", e);
                }
            },
            ApiEvent::Changed { what, result } => match result {
                Ok(()) => {
                    self.status = what;
                    self.reload(now);
                }
                Err(e) => {
                    log::error!("task update failed: {}", e);
                    self.status = format!("Error: {}", e);
                }
            },
        }
    }

    pub fn drain_events(&mut self, now: Instant) {
        while let Ok(event) = self.rx.try_recv() {
            self.handle_event(event, now);
        }
    }

    pub fn tick(&mut self, now: Instant) {
        self.drain_events(now);
        for effect in self.home.tick(now) {
            self.dispatch(effect);
        }
    }

    fn find_task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.all_tasks
            .iter_mut()
            .find(|task| task.id.as_deref() == Some(task_id))
    }

    pub fn active_tasks(&self) -> Vec<&Task> {
        self.all_tasks.iter().filter(|t| !t.is_completed).collect()
    }

    pub fn completed_tasks(&self) -> Vec<&Task> {
        self.all_tasks.iter().filter(|t| t.is_completed).collect()
    }

    pub fn next_tab(&mut self) {
        self.current_tab = (self.current_tab + 1) % TAB_TITLES.len();
    }

    pub fn previous_tab(&mut self) {
        self.current_tab = if self.current_tab == 0 {
            TAB_TITLES.len() - 1
        } else {
            self.current_tab - 1
        };
    }

    fn list_for_tab(&mut self) -> Option<(&mut ListState, usize)> {
        match self.current_tab {
            1 => {
                let len = self.active_tasks().len();
                Some((&mut self.task_list_state, len))
            }
            2 => {
                let len = self.completed_tasks().len();
                Some((&mut self.history_list_state, len))
            }
            _ => None,
        }
    }

    pub fn next_item(&mut self) {
        if let Some((state, len)) = self.list_for_tab() {
            if len == 0 {
                return;
            }
            let i = match state.selected() {
                Some(i) if i + 1 < len => i + 1,
                _ => 0,
            };
            state.select(Some(i));
        }
    }

    pub fn previous_item(&mut self) {
        if let Some((state, len)) = self.list_for_tab() {
            if len == 0 {
                return;
            }
            let i = match state.selected() {
                Some(0) | None => len - 1,
                Some(i) => i - 1,
            };
            state.select(Some(i));
        }
    }

    fn selected_task(&self) -> Option<Task> {
        match self.current_tab {
            1 => self
                .task_list_state
                .selected()
                .and_then(|i| self.active_tasks().get(i).map(|t| (*t).clone())),
            2 => self
                .history_list_state
                .selected()
                .and_then(|i| self.completed_tasks().get(i).map(|t| (*t).clone())),
            _ => None,
        }
    }

    fn with_selected(&mut self, action: impl FnOnce(&Self, Task, String)) {
        let Some(task) = self.selected_task() else {
            self.status = String::from("No task selected");
            return;
        };
        match task.id.clone() {
            Some(id) => action(self, task, id),
            None => self.status = format!("'{}' has no id", task.display_title()),
        }
    }

    pub fn delete_selected(&mut self) {
        self.with_selected(|app, task, id| {
            app.change(format!("Deleted '{}'", task.display_title()), id, None);
        });
    }

    pub fn complete_selected(&mut self) {
        self.with_selected(|app, task, id| {
            app.change(
                format!("Completed '{}'", task.display_title()),
                id,
                Some(TaskPatch::completed()),
            );
        });
    }

    pub fn restore_selected(&mut self) {
        self.with_selected(|app, task, id| {
            let patch = TaskPatch::restored(&task);
            app.change(format!("Restored '{}'", task.display_title()), id, Some(patch));
        });
    }

    pub fn open_add_form(&mut self) {
        self.form = AddTaskForm::default();
        self.popup_mode = PopupMode::AddTask;
    }

    pub fn close_popup(&mut self) {
        self.popup_mode = PopupMode::None;
    }

    pub fn submit_form(&mut self) {
        match self.form.validate() {
            Ok((title, seconds)) => {
                let task = Task::new(&title, seconds);
                let api = self.api.clone();
                let username = self.username.clone();
                self.spawn(async move {
                    let result = api.create_task(&username, &task).await;
                    ApiEvent::Changed {
                        what: format!("Added '{}'", title),
                        result,
                    }
                });
                self.close_popup();
            }
            Err(message) => self.form.error = Some(message),
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.close_popup(),
            KeyCode::Tab | KeyCode::BackTab => self.form.toggle_focus(),
            KeyCode::Enter => {
                if self.form.focus == FormField::Title {
                    self.form.toggle_focus();
                } else {
                    self.submit_form();
                }
            }
            KeyCode::Backspace => self.form.focused_mut().delete_char(),
            KeyCode::Left => self.form.focused_mut().move_cursor_left(),
            KeyCode::Right => self.form.focused_mut().move_cursor_right(),
            KeyCode::Home => self.form.focused_mut().move_to_start(),
            KeyCode::End => self.form.focused_mut().move_to_end(),
            KeyCode::Char(c) => self.form.focused_mut().insert_char(c),
            _ => {}
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if self.popup_mode == PopupMode::AddTask {
            self.handle_form_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab => self.next_tab(),
            KeyCode::BackTab => self.previous_tab(),
            KeyCode::Down => self.next_item(),
            KeyCode::Up => self.previous_item(),
            KeyCode::Char('r') => self.reload(now),
            KeyCode::Char(' ') if self.current_tab == 0 => {
                if let Some(effect) = self.home.toggle(now) {
                    self.dispatch(effect);
                }
            }
            KeyCode::Char('n') if self.current_tab == 0 => {
                self.home.next(now);
            }
            KeyCode::Char('a') if self.current_tab == 1 => self.open_add_form(),
            KeyCode::Char('c') if self.current_tab == 1 => self.complete_selected(),
            KeyCode::Char('b') if self.current_tab == 2 => self.restore_selected(),
            KeyCode::Char('d') if self.current_tab != 0 => self.delete_selected(),
            _ => {}
        }
    }

    /// Saves a running timer before the runtime goes away.
    pub fn shutdown(&mut self) {
        if !self.home.is_running() {
            return;
        }
        if let Some(Effect::SaveRemaining { task_id, seconds }) = self.home.toggle(Instant::now()) {
            let result = self.handle.block_on(self.api.update_task(
                &self.username,
                &task_id,
                &TaskPatch::remaining(seconds),
            ));
            if let Err(e) = result {
                log::error!("error saving timer state on exit: {}", e);
            }
        }
    }
}

fn clamp_selection(state: &mut ListState, len: usize) {
    match state.selected() {
        _ if len == 0 => state.select(None),
        Some(i) if i >= len => state.select(Some(len - 1)),
        None => state.select(Some(0)),
        _ => {}
    }
}

pub fn run_tui(config: &AppConfig, api: TasksApi, username: String, handle: Handle) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, api, username, handle);
    let res = run_app(&mut terminal, &mut app);
    app.shutdown();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        app.tick(Instant::now());
        terminal.draw(|f| ui(f, app, Instant::now()))?;

        if event::poll(FRAME_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key, Instant::now());
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn ui(f: &mut Frame, app: &mut App, now: Instant) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
        .split(f.area());

    let titles: Vec<Line> = TAB_TITLES.iter().cloned().map(Line::from).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Task Timer - {}", app.username)),
        )
        .select(app.current_tab)
        .style(Style::default().fg(Color::Cyan))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::Black));
    f.render_widget(tabs, chunks[0]);

    match app.current_tab {
        0 => render_home(f, app, chunks[1], now),
        1 => render_tasks(f, app, chunks[1]),
        2 => render_history(f, app, chunks[1]),
        _ => {}
    }

    let status = Paragraph::new(app.status.as_str()).style(Style::default().fg(Color::Gray));
    f.render_widget(status, chunks[2]);

    if app.popup_mode == PopupMode::AddTask {
        render_add_form(f, &app.form);
    }
}

// Helper function to create centered rectangles for popups
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn render_home(f: &mut Frame, app: &App, area: Rect, now: Instant) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let card_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(chunks[0]);

    let stack = app.home.stack();
    let rotating = stack.rotation_progress(now).is_some();

    for (slot, card_area) in Slot::ALL.iter().zip(card_areas.iter()) {
        let entry = stack.surface().entry(*slot);
        let (label, style, border) = match slot {
            Slot::Invisible => ("Up next", Style::default().fg(Color::DarkGray), Color::DarkGray),
            Slot::AboveMain => ("", Style::default().fg(Color::White), Color::Gray),
            Slot::Main => (
                "Now",
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                if rotating { Color::Yellow } else { Color::Cyan },
            ),
            Slot::BelowMain => ("", Style::default().fg(Color::Gray), Color::DarkGray),
        };
        let card = Paragraph::new(entry.title.as_str())
            .style(style)
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(label)
                    .border_style(Style::default().fg(border)),
            );
        f.render_widget(card, *card_area);
    }

    let controls = Paragraph::new("Space: Start/Pause  n: Next  r: Reload  Tab: Switch  q: Quit")
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(controls, card_areas[4]);

    render_dial(f, app, chunks[1]);
}

fn render_dial(f: &mut Frame, app: &App, area: Rect) {
    let timer = app.home.timer();
    let config = *timer.config();
    let face = timer.surface();
    let points: Vec<(f64, f64)> = face
        .path
        .as_ref()
        .map(|path| path.points(ARC_SAMPLES).into_iter().map(|(x, y)| (x, -y)).collect())
        .unwrap_or_default();
    let time_text = face.time_text.clone();
    let arc_color = if timer.is_running() { Color::Green } else { Color::Cyan };
    let margin = 10.0;

    let title = if timer.is_running() { "Running" } else { "Paused" };
    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .marker(Marker::Braille)
        .x_bounds([
            config.cx - config.radius - margin,
            config.cx + config.radius + margin,
        ])
        .y_bounds([
            -(config.cy + config.radius + margin),
            -(config.cy - config.radius - margin),
        ])
        .paint(move |ctx| {
            ctx.draw(&Circle {
                x: config.cx,
                y: -config.cy,
                radius: config.radius,
                color: Color::DarkGray,
            });
            ctx.layer();
            ctx.draw(&Points {
                coords: &points,
                color: arc_color,
            });
            ctx.print(
                config.cx - config.radius * 0.1,
                -config.cy,
                Line::from(Span::styled(
                    time_text.clone(),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                )),
            );
        });
    f.render_widget(canvas, area);
}

fn render_tasks(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let active = app.active_tasks();
    let items: Vec<ListItem> = active
        .iter()
        .map(|task| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", task.display_title()), Style::default().fg(Color::White)),
                Span::styled(
                    format!("[{}] ", format_duration(task.duration())),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(
                    format!("{} left", format_time(task.remaining())),
                    Style::default().fg(Color::Yellow),
                ),
            ]))
        })
        .collect();
    let selected = app
        .task_list_state
        .selected()
        .and_then(|i| active.get(i))
        .map(|task| {
            format!(
                "Task: {}\nDuration: {}\nRemaining: {}\n\n",
                task.display_title(),
                format_duration(task.duration()),
                format_time(task.remaining())
            )
        })
        .unwrap_or_else(|| String::from("No task selected\n\n"));

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Tasks"))
        .highlight_style(Style::default().bg(Color::LightGreen).add_modifier(Modifier::BOLD))
        .highlight_symbol(">> ");
    f.render_stateful_widget(list, chunks[0], &mut app.task_list_state);

    let info = Paragraph::new(format!(
        "{}Controls:\n• ↑/↓: Navigate\n• a: Add task\n• c: Mark completed\n• d: Delete\n• r: Refresh\n• q: Quit",
        selected
    ))
    .block(Block::default().borders(Borders::ALL).title("Task Info"))
    .style(Style::default().fg(Color::White));
    f.render_widget(info, chunks[1]);
}

fn render_history(f: &mut Frame, app: &mut App, area: Rect) {
    let completed = app.completed_tasks();
    let items: Vec<ListItem> = if completed.is_empty() {
        vec![ListItem::new("No completed tasks yet.")]
    } else {
        completed
            .iter()
            .map(|task| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{} ", task.display_title()), Style::default().fg(Color::White)),
                    Span::styled(
                        format!("[{}]", format_duration(task.duration())),
                        Style::default().fg(Color::Green),
                    ),
                ]))
            })
            .collect()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("History - b: Add back | d: Delete"),
        )
        .highlight_style(Style::default().bg(Color::LightGreen).add_modifier(Modifier::BOLD))
        .highlight_symbol(">> ");
    f.render_stateful_widget(list, area, &mut app.history_list_state);
}

fn input_line<'a>(label: &'a str, input: &'a LineInput, focused: bool) -> Line<'a> {
    let label_style = if focused {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let (before, after) = input.split_at_cursor();
    let mut spans = vec![Span::styled(label, label_style), Span::raw(before)];
    if focused {
        let mut rest = after.chars();
        let cursor = rest.next().map(String::from).unwrap_or_else(|| String::from(" "));
        spans.push(Span::styled(cursor, Style::default().bg(Color::Cyan).fg(Color::Black)));
        spans.push(Span::raw(rest.as_str()));
    } else {
        spans.push(Span::raw(after));
    }
    Line::from(spans)
}

fn render_add_form(f: &mut Frame, form: &AddTaskForm) {
    let area = centered_rect(60, 30, f.area());
    f.render_widget(Clear, area);

    let mut lines = vec![
        input_line("Title:    ", &form.title, form.focus == FormField::Title),
        input_line("Duration: ", &form.duration, form.focus == FormField::Duration),
        Line::from(""),
        Line::from(Span::styled(
            "Duration as H:MM:SS or \"1 hour 30 minutes\"",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from("Tab: Switch field | Enter: Next/Save | Esc: Cancel"),
    ];
    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(error.as_str(), Style::default().fg(Color::Red))));
    }

    let popup = Paragraph::new(lines).block(
        Block::default()
            .title("Add Task")
            .borders(Borders::ALL)
            .style(Style::default().bg(Color::DarkGray).fg(Color::White)),
    );
    f.render_widget(popup, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arc::ArcConfig;
    use crossterm::event::KeyModifiers;
    use serde_json::json;
    use tokio::runtime::Runtime;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn mount_tasks(rt: &Runtime, server: &MockServer, body: serde_json::Value) {
        rt.block_on(
            Mock::given(method("GET"))
                .and(path("/users/alice/tasks"))
                .respond_with(ResponseTemplate::new(200).set_body_json(body))
                .mount(server),
        );
    }

    fn app_for(rt: &Runtime, server: &MockServer) -> App {
        let config = AppConfig {
            api_base_url: server.uri(),
            username: Some("alice".to_string()),
            autosave: Duration::from_secs(15),
            arc: ArcConfig::default(),
        };
        let api = TasksApi::new(&server.uri()).unwrap();
        App::new(&config, api, "alice".to_string(), rt.handle().clone())
    }

    fn next_event(rt: &Runtime, app: &mut App) {
        let event = rt.block_on(app.rx.recv()).expect("store call finished");
        app.handle_event(event, Instant::now());
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE), Instant::now());
    }

    fn one_task() -> serde_json::Value {
        json!([{ "id": "t1", "title": "Write", "durationSeconds": 60, "remainingSeconds": 60 }])
    }

    #[test]
    fn test_clamp_selection() {
        let mut state = ListState::default();
        clamp_selection(&mut state, 3);
        assert_eq!(state.selected(), Some(0));

        state.select(Some(5));
        clamp_selection(&mut state, 2);
        assert_eq!(state.selected(), Some(1));

        clamp_selection(&mut state, 0);
        assert_eq!(state.selected(), None);
    }

    #[test]
    fn test_centered_rect_is_inside() {
        let outer = Rect::new(0, 0, 100, 50);
        let inner = centered_rect(60, 30, outer);
        assert_eq!(inner.width, 60);
        assert!(inner.x >= 19 && inner.right() <= 81);
        assert!(inner.y > 0 && inner.bottom() < 50);
    }

    #[test]
    fn test_reload_keeps_remaining_time_of_unacknowledged_save() {
        let rt = Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());
        mount_tasks(&rt, &server, one_task());
        rt.block_on(
            Mock::given(method("PATCH"))
                .and(path("/users/alice/tasks/t1"))
                .and(body_json(json!({ "remainingSeconds": 50 })))
                .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_millis(300)))
                .expect(1)
                .mount(&server),
        );

        let mut app = app_for(&rt, &server);
        next_event(&rt, &mut app);
        assert_eq!(app.home.timer().remaining_seconds(), 60);

        let t0 = Instant::now();
        assert_eq!(app.home.toggle(t0), None);
        app.home.tick(t0 + Duration::from_secs(10));
        assert_eq!(app.home.timer().remaining_seconds(), 50);

        // pauses, saves 50 and refetches; the fetch answers first with 60
        app.reload(t0 + Duration::from_secs(10));
        assert!(!app.home.is_running());
        next_event(&rt, &mut app);
        assert_eq!(app.home.timer().remaining_seconds(), 50);
        assert_eq!(app.all_tasks[0].remaining(), 50);

        next_event(&rt, &mut app);
        assert!(app.pending_saves.is_empty());
        assert_eq!(app.home.tasks()[0].remaining(), 50);
        rt.block_on(server.verify());
    }

    #[test]
    fn test_load_while_running_only_refreshes_lists() {
        let rt = Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());
        mount_tasks(&rt, &server, one_task());

        let mut app = app_for(&rt, &server);
        next_event(&rt, &mut app);
        app.home.toggle(Instant::now());
        assert!(app.home.is_running());

        let mut extra = Task::new("Read", 120);
        extra.id = Some("t2".to_string());
        let mut first = app.all_tasks[0].clone();
        first.remaining_seconds = Some(5);
        app.handle_event(ApiEvent::Loaded(Ok(vec![first, extra])), Instant::now());

        assert!(app.home.is_running());
        assert_eq!(app.home.tasks().len(), 1);
        assert_eq!(app.all_tasks.len(), 2);
        assert_eq!(app.task_list_state.selected(), Some(0));
    }

    #[test]
    fn test_completion_moves_task_to_history() {
        let rt = Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());
        mount_tasks(
            &rt,
            &server,
            json!([
                { "id": "t1", "title": "Write", "durationSeconds": 60 },
                { "id": "t2", "title": "Read", "durationSeconds": 120 }
            ]),
        );

        let mut app = app_for(&rt, &server);
        next_event(&rt, &mut app);
        assert_eq!(app.home.tasks().len(), 2);

        app.handle_event(
            ApiEvent::CompletionSaved {
                task_id: "t1".to_string(),
                result: Ok(()),
            },
            Instant::now(),
        );

        assert_eq!(app.active_tasks().len(), 1);
        assert_eq!(app.completed_tasks()[0].id.as_deref(), Some("t1"));
        assert_eq!(app.completed_tasks()[0].remaining(), 0);
        assert_eq!(app.home.tasks().len(), 1);
        assert_eq!(app.status, "Task completed");
    }

    #[test]
    fn test_store_errors_reach_the_status_line() {
        let rt = Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());
        rt.block_on(
            Mock::given(method("GET"))
                .and(path("/users/alice/tasks"))
                .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
                .mount(&server),
        );
        rt.block_on(
            Mock::given(method("PATCH"))
                .and(path("/users/alice/tasks/t1"))
                .respond_with(ResponseTemplate::new(503).set_body_string("down"))
                .mount(&server),
        );

        let mut app = app_for(&rt, &server);
        next_event(&rt, &mut app);
        assert!(app.status.starts_with("Error:"), "{}", app.status);
        assert!(app.status.contains("boom"));

        app.dispatch(Effect::SaveRemaining {
            task_id: "t1".to_string(),
            seconds: 12,
        });
        next_event(&rt, &mut app);
        assert!(app.status.starts_with("Error saving timer:"), "{}", app.status);
        assert!(app.pending_saves.is_empty());
    }

    #[test]
    fn test_keys_are_gated_by_tab() {
        let rt = Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());
        mount_tasks(&rt, &server, one_task());

        let mut app = app_for(&rt, &server);
        next_event(&rt, &mut app);

        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.popup_mode, PopupMode::None);

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.current_tab, 1);
        press(&mut app, KeyCode::Char(' '));
        assert!(!app.home.is_running());

        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.popup_mode, PopupMode::AddTask);
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
        assert_eq!(app.form.title.text, "q");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.popup_mode, PopupMode::None);

        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.current_tab, 0);
        press(&mut app, KeyCode::Char(' '));
        assert!(app.home.is_running());

        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.current_tab, 2);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_shutdown_saves_running_timer() {
        let rt = Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());
        mount_tasks(&rt, &server, one_task());
        rt.block_on(
            Mock::given(method("PATCH"))
                .and(path("/users/alice/tasks/t1"))
                .and(body_json(json!({ "remainingSeconds": 60 })))
                .respond_with(ResponseTemplate::new(204))
                .expect(1)
                .mount(&server),
        );

        let mut app = app_for(&rt, &server);
        next_event(&rt, &mut app);
        app.home.toggle(Instant::now());
        assert!(app.home.is_running());

        app.shutdown();
        assert!(!app.home.is_running());
        rt.block_on(server.verify());
    }
}
