//! Keyboard input for the viewer.

use super::scroll::ScrollAction;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::io;
use std::time::Duration;

/// What a key press asks the viewer to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerAction {
    Quit,
    Scroll(ScrollAction),
    ToggleFollow,
}

/// Source of key presses with a bounded wait.
pub trait KeySource {
    /// Wait at most `timeout` for the next key press. `Ok(None)` means the
    /// wait ran out.
    fn next_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>>;
}

/// Reads keys from the real terminal.
#[derive(Debug, Default)]
pub struct CrosstermKeys;

impl KeySource for CrosstermKeys {
    fn next_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            // Release/repeat events only arrive with keyboard enhancement,
            // which is never enabled; filter anyway.
            Event::Key(key) if key.kind != KeyEventKind::Release => Ok(Some(key)),
            _ => Ok(None),
        }
    }
}

/// Map a key press to an action. Unbound keys map to `None`.
pub fn action_for_key(key: KeyEvent) -> Option<ViewerAction> {
    use ScrollAction::*;

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(ViewerAction::Quit),
            KeyCode::Char('f') => Some(ViewerAction::Scroll(PageDown)),
            KeyCode::Char('b') => Some(ViewerAction::Scroll(PageUp)),
            _ => None,
        };
    }

    let action = match key.code {
        KeyCode::Char('q') | KeyCode::Esc => ViewerAction::Quit,
        KeyCode::Up | KeyCode::Char('k') => ViewerAction::Scroll(LineUp),
        KeyCode::Down | KeyCode::Char('j') => ViewerAction::Scroll(LineDown),
        KeyCode::PageUp | KeyCode::Char('b') => ViewerAction::Scroll(PageUp),
        KeyCode::PageDown | KeyCode::Char(' ') => ViewerAction::Scroll(PageDown),
        KeyCode::Home | KeyCode::Char('g') => ViewerAction::Scroll(Top),
        KeyCode::End | KeyCode::Char('G') => ViewerAction::Scroll(Bottom),
        KeyCode::Char('f') => ViewerAction::ToggleFollow,
        _ => return None,
    };
    Some(action)
}
