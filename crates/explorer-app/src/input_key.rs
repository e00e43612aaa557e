//! Terminal-independent key events
//!
//! The TUI converts crossterm key events into [`InputKey`] at its boundary,
//! so the state machine in this crate never depends on a terminal library.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKey {
    /// Printable character
    Char(char),
    /// Character with Ctrl held
    CharCtrl(char),

    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,

    Enter,
    Esc,
    Tab,
    BackTab,
    Backspace,
    Delete,

    /// Function key F1-F12
    F(u8),
}
