use super::*;
use crate::service::HttpTaskService;
use crate::task::TaskId;
use crossterm::event::KeyModifiers;
use ratatui::backend::TestBackend;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct MemoryStore {
    saved: Arc<Mutex<Option<Preferences>>>,
}

impl PreferenceStore for MemoryStore {
    fn load(&self) -> Preferences {
        self.saved.lock().unwrap().unwrap_or_default()
    }

    fn save(&self, preferences: &Preferences) -> io::Result<()> {
        *self.saved.lock().unwrap() = Some(*preferences);
        Ok(())
    }
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn type_text(app: &mut App<HttpTaskService>, text: &str) {
    for c in text.chars() {
        assert!(app.handle_key(key(KeyCode::Char(c))).is_none());
    }
}

fn app_with(tasks: Vec<Task>, store: MemoryStore) -> App<HttpTaskService> {
    let service = HttpTaskService::new("http://127.0.0.1:9").expect("service");
    let mut controller = TaskListController::new(Arc::new(service));
    controller.apply(Completion::Loaded(Ok(tasks)));
    App::new(controller, Box::new(store))
}

fn sample() -> Vec<Task> {
    vec![
        Task {
            id: TaskId(1),
            title: "Write report".into(),
            completed: false,
        },
        Task {
            id: TaskId(2),
            title: "Call plumber".into(),
            completed: true,
        },
    ]
}

fn rendered(app: &App<HttpTaskService>) -> String {
    let mut terminal = Terminal::new(TestBackend::new(80, 14)).expect("terminal");
    terminal.draw(|f| draw(f, app)).expect("draw");
    terminal
        .backend()
        .buffer()
        .content()
        .iter()
        .map(|cell| cell.symbol())
        .collect()
}

#[test]
fn renders_visible_tasks_for_filter() {
    let mut app = app_with(sample(), MemoryStore::default());
    let screen = rendered(&app);
    assert!(screen.contains("[ ] Write report"));
    assert!(screen.contains("[x] Call plumber"));

    app.handle_key(key(KeyCode::Char('3')));
    let screen = rendered(&app);
    assert!(screen.contains("Write report"));
    assert!(!screen.contains("Call plumber"));
}

#[test]
fn blank_new_task_sends_nothing() {
    let mut app = app_with(sample(), MemoryStore::default());
    app.handle_key(key(KeyCode::Char('a')));
    type_text(&mut app, "   ");
    assert!(app.handle_key(key(KeyCode::Enter)).is_none());
}

#[test]
fn typed_task_is_submitted_on_enter() {
    let mut app = app_with(Vec::new(), MemoryStore::default());
    app.handle_key(key(KeyCode::Char('a')));
    type_text(&mut app, "Buy milkk");
    app.handle_key(key(KeyCode::Backspace));
    assert_eq!(app.controller.draft(), "Buy milk");

    assert!(app.handle_key(key(KeyCode::Enter)).is_some());
    // Cleared only once the server confirms.
    assert_eq!(app.controller.draft(), "Buy milk");
}

#[test]
fn edit_session_follows_selection() {
    let mut app = app_with(sample(), MemoryStore::default());
    app.handle_key(key(KeyCode::Down));
    app.handle_key(key(KeyCode::Char('e')));
    assert_eq!(app.controller.editing(), Some(TaskId(2)));
    assert_eq!(app.controller.edit_draft(), "Call plumber");

    type_text(&mut app, "!");
    assert_eq!(app.controller.edit_draft(), "Call plumber!");
    assert!(rendered(&app).contains("Call plumber!_"));

    app.handle_key(key(KeyCode::Esc));
    assert_eq!(app.controller.editing(), None);
}

#[test]
fn toggle_and_delete_need_a_selection() {
    let mut app = app_with(Vec::new(), MemoryStore::default());
    assert!(app.handle_key(key(KeyCode::Char(' '))).is_none());
    assert!(app.handle_key(key(KeyCode::Char('d'))).is_none());

    let mut app = app_with(sample(), MemoryStore::default());
    assert!(app.handle_key(key(KeyCode::Char(' '))).is_some());
    assert!(app.handle_key(key(KeyCode::Char('d'))).is_some());
}

#[test]
fn theme_toggle_is_persisted() {
    let store = MemoryStore::default();
    let mut app = app_with(sample(), store.clone());
    assert!(!app.preferences().dark_mode);

    app.handle_key(key(KeyCode::Char('t')));
    assert!(app.preferences().dark_mode);
    assert_eq!(
        *store.saved.lock().unwrap(),
        Some(Preferences { dark_mode: true })
    );

    let reopened = app_with(sample(), store);
    assert!(reopened.preferences().dark_mode);
    assert!(rendered(&reopened).contains("theme: dark"));
}

#[test]
fn quit_key_stops_the_loop() {
    let mut app = app_with(sample(), MemoryStore::default());
    assert!(!app.should_quit());
    app.handle_key(key(KeyCode::Char('q')));
    assert!(app.should_quit());
}

#[test]
fn terminal_is_restored_when_setup_fails() {
    use std::cell::Cell;

    fn enter(restored: &Cell<bool>) -> io::Result<()> {
        let _restore = TerminalRestore::new(|| restored.set(true));
        let enter_alternate_screen: io::Result<()> =
            Err(io::Error::other("alternate screen unavailable"));
        enter_alternate_screen?;
        Ok(())
    }

    let restored = Cell::new(false);
    assert!(enter(&restored).is_err());
    assert!(restored.get());
}
