//! Application state (Model in TEA pattern)

use std::collections::BTreeSet;

use chrono::{DateTime, Local};
use explorer_core::{visible_rows, FormKey, MenuNode, VisibleRow};

use crate::config::UiSettings;
use crate::form::FormState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppPhase {
    #[default]
    Running,
    Quitting,
}

/// Panel receiving navigation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Menu,
    Form,
    Output,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Self::Menu => Self::Form,
            Self::Form => Self::Output,
            Self::Output => Self::Menu,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Menu => Self::Output,
            Self::Form => Self::Menu,
            Self::Output => Self::Form,
        }
    }
}

/// Text being typed into the selected control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBuffer {
    pub field: String,
    pub text: String,
    /// Cursor position in chars
    pub cursor: usize,
    pub multiline: bool,
}

impl EditBuffer {
    pub fn new(field: impl Into<String>, text: impl Into<String>, multiline: bool) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self {
            field: field.into(),
            text,
            cursor,
            multiline,
        }
    }

    fn byte_index(&self, char_pos: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let at = self.byte_index(self.cursor - 1);
        self.text.remove(at);
        self.cursor -= 1;
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Emitted call expression
    Expression,
    /// Successful call result
    Result,
    Error,
    Info,
    /// `console.log` from a callback
    Console,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputEntry {
    pub timestamp: DateTime<Local>,
    pub kind: OutputKind,
    pub text: String,
}

/// Oldest entries are dropped beyond this
pub const MAX_OUTPUT_ENTRIES: usize = 500;

#[derive(Debug)]
pub struct AppState {
    pub phase: AppPhase,
    pub focus: Focus,

    pub menu: Vec<MenuNode>,
    pub expanded: BTreeSet<String>,
    /// Index into the visible menu rows
    pub menu_cursor: usize,

    pub form: Option<FormState>,
    /// Index into the form's controls
    pub field_cursor: usize,
    pub editing: Option<EditBuffer>,

    pub output: Vec<OutputEntry>,
    /// Lines scrolled up from the newest entry
    pub output_scroll: usize,

    /// Form whose call is in flight
    pub submitting: Option<FormKey>,

    pub ui: UiSettings,
}

impl AppState {
    pub fn new(menu: Vec<MenuNode>, ui: UiSettings) -> Self {
        Self {
            phase: AppPhase::Running,
            focus: Focus::Menu,
            menu,
            expanded: BTreeSet::new(),
            menu_cursor: 0,
            form: None,
            field_cursor: 0,
            editing: None,
            output: Vec::new(),
            output_scroll: 0,
            submitting: None,
            ui,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.phase == AppPhase::Quitting
    }

    pub fn visible_menu(&self) -> Vec<VisibleRow> {
        visible_rows(&self.menu, &self.expanded)
    }

    pub fn selected_row(&self) -> Option<VisibleRow> {
        self.visible_menu().into_iter().nth(self.menu_cursor)
    }

    /// Move the menu cursor onto `key` if it is visible
    pub fn select_menu_key(&mut self, key: &str) {
        if let Some(index) = self.visible_menu().iter().position(|row| row.key == key) {
            self.menu_cursor = index;
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.is_some()
    }

    pub fn push_output(&mut self, kind: OutputKind, text: impl Into<String>) {
        self.output.push(OutputEntry {
            timestamp: Local::now(),
            kind,
            text: text.into(),
        });
        if self.output.len() > MAX_OUTPUT_ENTRIES {
            let excess = self.output.len() - MAX_OUTPUT_ENTRIES;
            self.output.drain(..excess);
        }
        self.output_scroll = 0;
    }

    pub fn last_output(&self) -> Option<&OutputEntry> {
        self.output.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_buffer_handles_multibyte_text() {
        let mut buffer = EditBuffer::new("to", "añb", false);
        assert_eq!(buffer.cursor, 3);
        buffer.left();
        buffer.backspace();
        assert_eq!(buffer.text, "ab");
        buffer.insert('ü');
        assert_eq!(buffer.text, "aüb");
        buffer.right();
        buffer.right();
        assert_eq!(buffer.cursor, 3);
    }

    #[test]
    fn test_output_is_capped() {
        let mut state = AppState::new(vec![], UiSettings::default());
        for i in 0..MAX_OUTPUT_ENTRIES + 5 {
            state.push_output(OutputKind::Info, format!("line {i}"));
        }
        assert_eq!(state.output.len(), MAX_OUTPUT_ENTRIES);
        assert_eq!(state.output[0].text, "line 5");
    }

    #[test]
    fn test_focus_cycles() {
        assert_eq!(Focus::Menu.next().next().next(), Focus::Menu);
        assert_eq!(Focus::Menu.prev(), Focus::Output);
    }
}
