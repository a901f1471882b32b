//! Key handling: crossterm events to editor/host actions

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What a key press means to the assistant UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Regular character input
    Char(char),
    /// Enter: send the query or run the command
    Submit,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    /// Close a popup, or abort a pending request
    Escape,
    /// Ctrl+C: abort a pending request, quit when idle
    Interrupt,
    /// Ctrl+Q
    Quit,
    /// Ctrl+L: clear transcript and image
    ClearSession,
    /// Ctrl+O: start an `/image` command
    OpenImage,
    /// Ctrl+S: open the suggested questions picker
    Suggestions,
    /// Ctrl+U: clear the input line
    ClearLine,
    /// Ctrl+W: delete the word before the cursor
    DeleteWord,
    /// Bracketed paste
    Paste(String),
    Unknown,
}

/// Convert a crossterm key event to an action
pub fn key_to_action(event: KeyEvent) -> Action {
    let KeyEvent {
        code, modifiers, ..
    } = event;

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => Action::Interrupt,
            KeyCode::Char('q') | KeyCode::Char('d') => Action::Quit,
            KeyCode::Char('l') => Action::ClearSession,
            KeyCode::Char('o') => Action::OpenImage,
            KeyCode::Char('s') => Action::Suggestions,
            KeyCode::Char('u') => Action::ClearLine,
            KeyCode::Char('w') => Action::DeleteWord,
            KeyCode::Char('a') => Action::Home,
            KeyCode::Char('e') => Action::End,
            _ => Action::Unknown,
        };
    }

    if modifiers.contains(KeyModifiers::ALT) {
        return Action::Unknown;
    }

    match code {
        KeyCode::Char(c) => Action::Char(c),
        KeyCode::Enter => Action::Submit,
        KeyCode::Backspace => Action::Backspace,
        KeyCode::Delete => Action::Delete,
        KeyCode::Left => Action::Left,
        KeyCode::Right => Action::Right,
        KeyCode::Up => Action::Up,
        KeyCode::Down => Action::Down,
        KeyCode::Home => Action::Home,
        KeyCode::End => Action::End,
        KeyCode::PageUp => Action::PageUp,
        KeyCode::PageDown => Action::PageDown,
        KeyCode::Esc => Action::Escape,
        _ => Action::Unknown,
    }
}

/// Convert a crossterm event to an action. Key releases are ignored.
pub fn event_to_action(event: Event) -> Option<Action> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => Some(key_to_action(key)),
        Event::Paste(text) => Some(Action::Paste(text)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn test_control_bindings() {
        assert_eq!(key_to_action(ctrl('c')), Action::Interrupt);
        assert_eq!(key_to_action(ctrl('l')), Action::ClearSession);
        assert_eq!(key_to_action(ctrl('o')), Action::OpenImage);
        assert_eq!(key_to_action(ctrl('s')), Action::Suggestions);
        assert_eq!(key_to_action(ctrl('q')), Action::Quit);
        assert_eq!(key_to_action(ctrl('z')), Action::Unknown);
    }

    #[test]
    fn test_plain_keys() {
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(key_to_action(enter), Action::Submit);
        let shifted = KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT);
        assert_eq!(key_to_action(shifted), Action::Char('A'));
    }

    #[test]
    fn test_paste_event() {
        assert_eq!(
            event_to_action(Event::Paste("red eye".into())),
            Some(Action::Paste("red eye".into()))
        );
        assert_eq!(event_to_action(Event::FocusGained), None);
    }
}
