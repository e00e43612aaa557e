//! Collapsible method menu

use explorer_core::VisibleRow;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use super::truncate_to_width;
use crate::theme::styles;

pub struct MenuPanel<'a> {
    rows: &'a [VisibleRow],
    cursor: usize,
    focused: bool,
}

impl<'a> MenuPanel<'a> {
    pub fn new(rows: &'a [VisibleRow], cursor: usize) -> Self {
        Self {
            rows,
            cursor,
            focused: false,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    fn row_line(&self, index: usize, row: &VisibleRow, width: usize) -> Line<'static> {
        let marker = match (row.has_children, row.expanded) {
            (true, true) => "▾ ",
            (true, false) => "▸ ",
            (false, _) => "  ",
        };
        let indent = "  ".repeat(row.depth);
        let label_width = width.saturating_sub(indent.len() + 2);
        let label = truncate_to_width(&row.label, label_width);

        let style = if index == self.cursor {
            styles::selected()
        } else if row.has_children {
            styles::text_secondary()
        } else {
            styles::text_primary()
        };
        Line::from(vec![
            Span::raw(indent),
            Span::styled(marker, styles::text_muted()),
            Span::styled(label, style),
        ])
    }
}

impl Widget for MenuPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = styles::panel_block("Methods", self.focused);
        let inner = block.inner(area);
        block.render(area, buf);

        let height = inner.height as usize;
        if height == 0 {
            return;
        }
        // keep the cursor on screen
        let offset = self.cursor.saturating_sub(height - 1);
        let lines: Vec<Line> = self
            .rows
            .iter()
            .enumerate()
            .skip(offset)
            .take(height)
            .map(|(i, row)| self.row_line(i, row, inner.width as usize))
            .collect();

        Paragraph::new(lines).render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_state, TestTerminal};

    #[test]
    fn test_menu_shows_collapsed_branches() {
        let state = create_test_state();
        let rows = state.visible_menu();
        let mut term = TestTerminal::with_size(30, 8);

        term.render_widget(MenuPanel::new(&rows, 0), term.area());

        assert!(term.buffer_contains("Methods"));
        assert!(term.buffer_contains("▸ Messaging"));
        assert!(term.buffer_contains("▸ Groups"));
        assert!(!term.buffer_contains("Send text"));
    }

    #[test]
    fn test_menu_shows_expanded_children_indented() {
        let mut state = create_test_state();
        state.expanded.insert("im".to_string());
        let rows = state.visible_menu();
        let mut term = TestTerminal::with_size(30, 8);

        term.render_widget(MenuPanel::new(&rows, 1).focused(true), term.area());

        assert!(term.buffer_contains("▾ Messaging"));
        let line = term.find_line("Send text").unwrap();
        assert!(term.line_contains(line, "│    Send text"));
    }

    #[test]
    fn test_menu_scrolls_to_cursor() {
        let mut state = create_test_state();
        state.expanded.insert("im".to_string());
        state.expanded.insert("group".to_string());
        let rows = state.visible_menu();
        // two visible rows inside the border
        let mut term = TestTerminal::with_size(30, 4);

        term.render_widget(MenuPanel::new(&rows, 4), term.area());

        assert!(term.buffer_contains("Join"));
        assert!(!term.buffer_contains("Messaging"));
    }
}
