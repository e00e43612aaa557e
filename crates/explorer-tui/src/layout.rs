//! Screen layout for the TUI
//!
//! ```text
//! ┌ header ─────────────────────────────────┐
//! ├ menu ──────┬ form ──────────────────────┤
//! │            ├ output ────────────────────┤
//! └ status bar ─────────────────────────────┘
//! ```

use ratatui::layout::{Constraint, Layout, Rect};

/// Narrowest menu that still shows a label
const MIN_MENU_WIDTH: u16 = 16;

#[derive(Debug, Clone, Copy)]
pub struct ScreenAreas {
    pub header: Rect,
    pub menu: Rect,
    pub form: Rect,
    pub output: Rect,
    pub status: Rect,
}

/// Split the screen; the menu never takes more than half the width
pub fn create(area: Rect, menu_width: u16) -> ScreenAreas {
    let [header, body, status] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(area);

    let menu_width = menu_width.max(MIN_MENU_WIDTH).min(body.width / 2);
    let [menu, right] =
        Layout::horizontal([Constraint::Length(menu_width), Constraint::Min(10)]).areas(body);

    let [form, output] =
        Layout::vertical([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(right);

    ScreenAreas {
        header,
        menu,
        form,
        output,
        status,
    }
}
