//! Widgets for the explorer panels

mod form_panel;
mod menu_panel;
mod output_pane;
mod status_bar;

pub use form_panel::FormPanel;
pub use menu_panel::MenuPanel;
pub use output_pane::OutputPane;
pub use status_bar::StatusBar;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Cut `text` to at most `max` display columns, marking the cut with `…`
pub(crate) fn truncate_to_width(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}
