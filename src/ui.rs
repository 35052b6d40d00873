use crate::preferences::{PreferenceStore, Preferences};
use crate::service::TaskService;
use crate::task::Task;
use crate::task_list::{Completion, Filter, PendingRequest, TaskListController};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use std::{io, sync::mpsc, time::Duration};
use tokio::runtime::Handle;
use tracing::{debug, warn};

const TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub base: Style,
    pub accent: Color,
    pub done: Style,
    pub error: Style,
}

impl Theme {
    pub fn for_preferences(preferences: &Preferences) -> Self {
        if preferences.dark_mode {
            Self {
                base: Style::default().fg(Color::Gray).bg(Color::Black),
                accent: Color::Cyan,
                done: Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::CROSSED_OUT),
                error: Style::default().fg(Color::LightRed),
            }
        } else {
            Self {
                base: Style::default().fg(Color::Black).bg(Color::White),
                accent: Color::Blue,
                done: Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::CROSSED_OUT),
                error: Style::default().fg(Color::Red),
            }
        }
    }
}

/// Terminal front-end state around a [`TaskListController`].
pub struct App<S> {
    pub controller: TaskListController<S>,
    preferences: Preferences,
    store: Box<dyn PreferenceStore>,
    selected: usize,
    adding: bool,
    in_flight: usize,
    should_quit: bool,
}

impl<S: TaskService + 'static> App<S> {
    pub fn new(controller: TaskListController<S>, store: Box<dyn PreferenceStore>) -> Self {
        let preferences = store.load();
        Self {
            controller,
            preferences,
            store,
            selected: 0,
            adding: false,
            in_flight: 0,
            should_quit: false,
        }
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn selected_task(&self) -> Option<&Task> {
        self.controller.visible_tasks().nth(self.selected)
    }

    fn clamp_selection(&mut self) {
        let len = self.controller.visible_tasks().count();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    fn toggle_dark_mode(&mut self) {
        self.preferences.dark_mode = !self.preferences.dark_mode;
        if let Err(err) = self.store.save(&self.preferences) {
            warn!("Failed to save preferences: {err}");
        }
    }

    fn set_filter(&mut self, filter: Filter) {
        self.controller.set_filter(filter);
        self.clamp_selection();
    }

    pub fn apply(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.controller.apply(completion);
        self.clamp_selection();
    }

    /// Turns a key press into local changes and, possibly, a remote request.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<PendingRequest> {
        if let Some(id) = self.controller.editing() {
            match key.code {
                KeyCode::Enter => return self.controller.begin_save_edit(id),
                KeyCode::Esc => self.controller.cancel_editing(),
                KeyCode::Backspace => {
                    let mut text = self.controller.edit_draft().to_string();
                    text.pop();
                    self.controller.set_edit_draft(text);
                }
                KeyCode::Char(c) => {
                    let text = format!("{}{c}", self.controller.edit_draft());
                    self.controller.set_edit_draft(text);
                }
                _ => {}
            }
            return None;
        }

        if self.adding {
            match key.code {
                KeyCode::Enter => {
                    self.adding = false;
                    return self.controller.begin_add(self.controller.draft());
                }
                KeyCode::Esc => self.adding = false,
                KeyCode::Backspace => {
                    let mut text = self.controller.draft().to_string();
                    text.pop();
                    self.controller.set_draft(text);
                }
                KeyCode::Char(c) => {
                    let text = format!("{}{c}", self.controller.draft());
                    self.controller.set_draft(text);
                }
                _ => {}
            }
            return None;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('a') => self.adding = true,
            KeyCode::Char('e') => {
                if let Some(task) = self.selected_task() {
                    let (id, title) = (task.id, task.title.clone());
                    self.controller.start_editing(id, title);
                }
            }
            KeyCode::Char(' ') => {
                let id = self.selected_task()?.id;
                return self.controller.begin_toggle(id);
            }
            KeyCode::Char('d') => {
                let id = self.selected_task()?.id;
                return Some(self.controller.begin_remove(id));
            }
            KeyCode::Char('r') => return Some(self.controller.begin_load()),
            KeyCode::Char('f') => self.set_filter(self.controller.filter().next()),
            KeyCode::Char('1') => self.set_filter(Filter::All),
            KeyCode::Char('2') => self.set_filter(Filter::Completed),
            KeyCode::Char('3') => self.set_filter(Filter::Pending),
            KeyCode::Char('t') => self.toggle_dark_mode(),
            KeyCode::Up => {
                if self.selected > 0 {
                    self.selected -= 1;
                }
            }
            KeyCode::Down => {
                let max_tasks = self.controller.visible_tasks().count();
                if self.selected + 1 < max_tasks {
                    self.selected += 1;
                }
            }
            _ => {}
        }
        None
    }
}

pub fn run_app<B: Backend, S: TaskService + 'static>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
    runtime: &Handle,
) -> io::Result<()> {
    let (tx, rx) = mpsc::channel::<Completion>();
    let initial = app.controller.begin_load();
    dispatch(app, initial, &tx, runtime);

    loop {
        while let Ok(completion) = rx.try_recv() {
            app.apply(completion);
        }

        terminal.draw(|f| draw(f, app))?;

        if !event::poll(TICK)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(pending) = app.handle_key(key) {
                debug!(in_flight = app.in_flight, "dispatching request");
                dispatch(app, pending, &tx, runtime);
            }
            if app.should_quit {
                return Ok(());
            }
        }
    }
}

/// Runs `restore` when dropped, so the terminal is put back on every exit path.
pub struct TerminalRestore<F: FnMut()> {
    restore: F,
}

impl<F: FnMut()> TerminalRestore<F> {
    pub fn new(restore: F) -> Self {
        Self { restore }
    }
}

impl<F: FnMut()> Drop for TerminalRestore<F> {
    fn drop(&mut self) {
        (self.restore)();
    }
}

fn dispatch<S>(
    app: &mut App<S>,
    pending: PendingRequest,
    tx: &mpsc::Sender<Completion>,
    runtime: &Handle,
) {
    app.in_flight += 1;
    let tx = tx.clone();
    runtime.spawn(async move {
        let _ = tx.send(pending.await);
    });
}

pub fn draw<S: TaskService + 'static>(f: &mut Frame, app: &App<S>) {
    let theme = Theme::for_preferences(&app.preferences);
    let area = f.area();
    f.render_widget(Block::default().style(theme.base), area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(area);

    let filter_spans: Vec<Span> = Filter::ALL
        .iter()
        .map(|filter| {
            if *filter == app.controller.filter() {
                Span::styled(
                    format!(" [{filter}] "),
                    Style::default()
                        .fg(theme.accent)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                Span::raw(format!("  {filter}  "))
            }
        })
        .collect();
    let mode = if app.preferences.dark_mode { "dark" } else { "light" };
    let mut header = filter_spans;
    header.push(Span::raw(format!("   theme: {mode}")));
    if app.in_flight > 0 {
        header.push(Span::raw(format!("   syncing ({})", app.in_flight)));
    }
    f.render_widget(
        Paragraph::new(Line::from(header))
            .block(Block::default().title("To-Do List").borders(Borders::ALL)),
        chunks[0],
    );

    let editing = app.controller.editing();
    let items: Vec<ListItem> = app
        .controller
        .visible_tasks()
        .map(|t| {
            let check = if t.completed { "[x] " } else { "[ ] " };
            let title = if editing == Some(t.id) {
                Span::styled(
                    format!("{}_", app.controller.edit_draft()),
                    Style::default().fg(theme.accent),
                )
            } else if t.completed {
                Span::styled(t.title.clone(), theme.done)
            } else {
                Span::raw(t.title.clone())
            };
            ListItem::new(Line::from(vec![
                Span::raw(format!("#{:<4} ", t.id.0)),
                Span::raw(check),
                title,
            ]))
        })
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .title(format!("Tasks ({})", app.controller.filter()))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.accent)),
        )
        .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED));
    let mut state = ListState::default();
    if app.controller.visible_tasks().next().is_some() {
        state.select(Some(app.selected));
    }
    f.render_stateful_widget(list, chunks[1], &mut state);

    let (input_title, input_text) = if editing.is_some() {
        ("Edit task (Enter save, Esc cancel)", app.controller.edit_draft())
    } else if app.adding {
        ("New task (Enter add, Esc close)", app.controller.draft())
    } else {
        ("New task (a)", app.controller.draft())
    };
    let input_style = if app.adding || editing.is_some() {
        Style::default().fg(theme.accent)
    } else {
        Style::default()
    };
    f.render_widget(
        Paragraph::new(input_text).block(
            Block::default()
                .title(input_title)
                .borders(Borders::ALL)
                .border_style(input_style),
        ),
        chunks[2],
    );

    let status = match app.controller.last_error() {
        Some(err) => Line::from(Span::styled(err.to_string(), theme.error)),
        None => Line::from(
            "a add  e edit  space toggle  d delete  f/1/2/3 filter  t theme  r reload  q quit",
        ),
    };
    f.render_widget(Paragraph::new(status), chunks[3]);
}

#[cfg(test)]
#[path = "tests/ui_tests.rs"]
mod tests;
