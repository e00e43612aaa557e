//! Status bar widget
//!
//! Shows the focused panel, whether a call is in flight, and the key
//! bindings that apply right now.

use explorer_app::state::Focus;
use explorer_app::AppState;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::theme::styles;

pub struct StatusBar<'a> {
    state: &'a AppState,
}

impl<'a> StatusBar<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    fn mode_indicator(&self) -> Span<'static> {
        if self.state.editing.is_some() {
            Span::styled("● EDIT", styles::status_yellow())
        } else if let Some(key) = &self.state.submitting {
            Span::styled(format!("◌ calling {}", key), styles::status_yellow())
        } else {
            Span::styled("● READY", styles::status_green())
        }
    }

    fn focus_label(&self) -> &'static str {
        match self.state.focus {
            Focus::Menu => "menu",
            Focus::Form => "form",
            Focus::Output => "output",
        }
    }

    fn key_hints(&self) -> &'static str {
        match (&self.state.editing, self.state.focus) {
            (Some(buffer), _) if buffer.multiline => "Enter newline  Ctrl+S save  Esc cancel",
            (Some(_), _) => "Enter save  Esc cancel",
            (None, Focus::Menu) => "j/k move  Enter open  h collapse  Tab next  q quit",
            (None, Focus::Form) => {
                "Enter edit  Space toggle  Del clear  s call  e emit  r reset  q quit"
            }
            (None, Focus::Output) => "j/k scroll  c clear  Tab next  q quit",
        }
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let line = Line::from(vec![
            Span::raw(" "),
            self.mode_indicator(),
            Span::styled(" │ ", styles::text_muted()),
            Span::styled(self.focus_label(), styles::text_secondary()),
            Span::styled(" │ ", styles::text_muted()),
            Span::styled(self.key_hints(), styles::text_muted()),
        ]);
        Paragraph::new(line).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_state_with_form, create_test_state, TestTerminal};
    use explorer_app::state::EditBuffer;
    use explorer_core::FormKey;

    #[test]
    fn test_status_bar_ready_in_menu() {
        let state = create_test_state();
        let mut term = TestTerminal::with_size(100, 1);

        term.render_widget(StatusBar::new(&state), term.area());

        assert!(term.buffer_contains("READY"));
        assert!(term.buffer_contains("menu"));
        assert!(term.buffer_contains("Enter open"));
    }

    #[test]
    fn test_status_bar_shows_call_in_flight() {
        let mut state = create_state_with_form();
        state.focus = Focus::Form;
        state.submitting = Some(FormKey::new("im", "sendText"));
        let mut term = TestTerminal::with_size(100, 1);

        term.render_widget(StatusBar::new(&state), term.area());

        assert!(term.buffer_contains("calling im.sendText"));
        assert!(term.buffer_contains("s call"));
    }

    #[test]
    fn test_status_bar_multiline_edit_hints() {
        let mut state = create_state_with_form();
        state.editing = Some(EditBuffer::new("extra", "{}", true));
        let mut term = TestTerminal::with_size(100, 1);

        term.render_widget(StatusBar::new(&state), term.area());

        assert!(term.buffer_contains("EDIT"));
        assert!(term.buffer_contains("Ctrl+S save"));
    }
}
