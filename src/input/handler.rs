use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};

use crate::app::ViewMode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    MoveUp,
    MoveDown,
    MoveToTop,
    MoveToBottom,
    Back,
    ShowHelp,
    ToggleLog,
    ClearLog,
    FieldInput(char),
    FieldBackspace,
    NextField,
    PrevField,
    LoginEnvironment(bool),
    Connect,
    Refresh,
    CycleEnvironment(bool),
    Reconnect,
    Disconnect,
    SwitchPanel,
    None,
}

pub fn handle_event(event: &Event, mode: ViewMode) -> Action {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(key, mode),
        Event::Mouse(mouse) => handle_mouse(mouse.kind, mode),
        _ => Action::None,
    }
}

fn handle_mouse(kind: MouseEventKind, mode: ViewMode) -> Action {
    match (kind, mode) {
        (MouseEventKind::ScrollUp, ViewMode::Dashboard | ViewMode::Log) => Action::MoveUp,
        (MouseEventKind::ScrollDown, ViewMode::Dashboard | ViewMode::Log) => Action::MoveDown,
        _ => Action::None,
    }
}

fn handle_key(key: &KeyEvent, mode: ViewMode) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Action::Quit;
    }

    match mode {
        ViewMode::Login => handle_login_key(key),
        ViewMode::Dashboard => handle_dashboard_key(key),
        ViewMode::Help => handle_help_key(key),
        ViewMode::Log => handle_log_key(key),
    }
}

/// Printable keys go into the focused field, so only non-character keys
/// act as commands here.
fn handle_login_key(key: &KeyEvent) -> Action {
    match key.code {
        KeyCode::Enter => Action::Connect,
        KeyCode::Esc => Action::Back,
        KeyCode::Tab | KeyCode::Down => Action::NextField,
        KeyCode::BackTab | KeyCode::Up => Action::PrevField,
        KeyCode::Left => Action::LoginEnvironment(false),
        KeyCode::Right => Action::LoginEnvironment(true),
        KeyCode::Backspace => Action::FieldBackspace,
        KeyCode::Char(c) => Action::FieldInput(c),
        _ => Action::None,
    }
}

fn handle_dashboard_key(key: &KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('r') => Action::Refresh,
        KeyCode::Char('e') => Action::CycleEnvironment(true),
        KeyCode::Char('E') => Action::CycleEnvironment(false),
        KeyCode::Char('c') => Action::Reconnect,
        KeyCode::Char('x') => Action::Disconnect,
        KeyCode::Tab | KeyCode::BackTab => Action::SwitchPanel,
        KeyCode::Char('j') | KeyCode::Down => Action::MoveDown,
        KeyCode::Char('k') | KeyCode::Up => Action::MoveUp,
        KeyCode::Char('g') | KeyCode::Home => Action::MoveToTop,
        KeyCode::Char('G') | KeyCode::End => Action::MoveToBottom,
        KeyCode::Char('L') => Action::ToggleLog,
        KeyCode::Char('?') => Action::ShowHelp,
        _ => Action::None,
    }
}

fn handle_help_key(key: &KeyEvent) -> Action {
    match key.code {
        KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => Action::ShowHelp,
        _ => Action::None,
    }
}

fn handle_log_key(key: &KeyEvent) -> Action {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('L') => Action::ToggleLog,
        KeyCode::Char('j') | KeyCode::Down => Action::MoveDown,
        KeyCode::Char('k') | KeyCode::Up => Action::MoveUp,
        KeyCode::Char('g') => Action::MoveToTop,
        KeyCode::Char('G') => Action::MoveToBottom,
        KeyCode::Char('c') => Action::ClearLog,
        _ => Action::None,
    }
}
