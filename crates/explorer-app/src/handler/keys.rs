//! Key bindings

use crate::input_key::InputKey;
use crate::message::Message;
use crate::state::{AppState, Focus};

/// Map a key to a message for the current focus and edit mode
pub fn handle_key(state: &AppState, key: InputKey) -> Option<Message> {
    if let Some(buffer) = &state.editing {
        return match key {
            InputKey::Esc => Some(Message::EditCancel),
            InputKey::Enter if buffer.multiline => Some(Message::EditNewline),
            InputKey::Enter | InputKey::CharCtrl('s') => Some(Message::EditCommit),
            InputKey::Backspace => Some(Message::EditBackspace),
            InputKey::Left => Some(Message::EditLeft),
            InputKey::Right => Some(Message::EditRight),
            InputKey::Char(c) => Some(Message::EditInput(c)),
            InputKey::Tab => Some(Message::EditInput(' ')),
            _ => None,
        };
    }

    // Global bindings
    match key {
        InputKey::CharCtrl('c') => return Some(Message::Quit),
        InputKey::Char('q') => return Some(Message::RequestQuit),
        InputKey::Tab => return Some(Message::FocusNext),
        InputKey::BackTab => return Some(Message::FocusPrev),
        InputKey::CharCtrl('s') | InputKey::F(5) => return Some(Message::Submit),
        InputKey::CharCtrl('e') | InputKey::F(6) => return Some(Message::Emit),
        InputKey::CharCtrl('l') => return Some(Message::ClearOutput),
        _ => {}
    }

    match state.focus {
        Focus::Menu => match key {
            InputKey::Up | InputKey::Char('k') => Some(Message::MenuUp),
            InputKey::Down | InputKey::Char('j') => Some(Message::MenuDown),
            InputKey::Enter | InputKey::Right | InputKey::Char('l') => Some(Message::MenuActivate),
            InputKey::Left | InputKey::Char('h') => Some(Message::MenuCollapse),
            _ => None,
        },
        Focus::Form => match key {
            InputKey::Up | InputKey::Char('k') => Some(Message::FieldUp),
            InputKey::Down | InputKey::Char('j') => Some(Message::FieldDown),
            InputKey::Enter | InputKey::Char('i') => Some(Message::BeginEdit),
            InputKey::Char(' ') => Some(Message::ToggleField),
            InputKey::Delete => Some(Message::ClearField),
            InputKey::Char('s') => Some(Message::Submit),
            InputKey::Char('e') => Some(Message::Emit),
            InputKey::Char('r') => Some(Message::ResetForm),
            InputKey::Esc => Some(Message::FocusPrev),
            _ => None,
        },
        Focus::Output => match key {
            InputKey::Up | InputKey::Char('k') | InputKey::PageUp => Some(Message::OutputUp),
            InputKey::Down | InputKey::Char('j') | InputKey::PageDown => Some(Message::OutputDown),
            InputKey::Char('c') => Some(Message::ClearOutput),
            InputKey::Esc => Some(Message::FocusPrev),
            _ => None,
        },
    }
}
