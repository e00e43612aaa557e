//! Main render/view function (View in TEA pattern)


use explorer_app::state::Focus;
use explorer_app::AppState;
use explorer_core::label_path;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use ratatui::Frame;

use crate::layout;
use crate::theme::{palette, styles};
use crate::widgets;

/// Render the complete UI
///
/// Pure with respect to `state`: everything shown is derived from it.
pub fn view(frame: &mut Frame, state: &AppState) {
    let area = frame.area();
    frame.render_widget(
        Block::default().style(Style::default().bg(palette::DEEPEST_BG)),
        area,
    );

    let areas = layout::create(area, state.ui.menu_width);

    frame.render_widget(header(state), areas.header);

    let rows = state.visible_menu();
    frame.render_widget(
        widgets::MenuPanel::new(&rows, state.menu_cursor).focused(state.focus == Focus::Menu),
        areas.menu,
    );

    frame.render_widget(
        widgets::FormPanel::new(state.form.as_ref(), state.field_cursor)
            .editing(state.editing.as_ref())
            .focused(state.focus == Focus::Form)
            .show_descriptions(state.ui.show_descriptions)
            .submitting(
                state.submitting.is_some()
                    && state.submitting.as_ref() == state.form.as_ref().map(|f| f.key()),
            ),
        areas.form,
    );

    frame.render_widget(
        widgets::OutputPane::new(&state.output)
            .scroll(state.output_scroll)
            .focused(state.focus == Focus::Output),
        areas.output,
    );

    frame.render_widget(widgets::StatusBar::new(state), areas.status);
}

/// Title plus the menu path of the open page
fn header(state: &AppState) -> Paragraph<'static> {
    let mut spans = vec![Span::styled(" SDK Explorer", styles::accent_bold())];
    if let Some(form) = &state.form {
        let path = label_path(&state.menu, &form.key().to_string());
        let crumb = if path.is_empty() {
            form.key().to_string()
        } else {
            path.join(" › ")
        };
        spans.push(Span::styled("  ", styles::text_muted()));
        spans.push(Span::styled(crumb, styles::text_secondary()));
    }
    Paragraph::new(Line::from(spans))
}
