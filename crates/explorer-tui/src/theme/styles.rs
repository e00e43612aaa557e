//! Semantic style builders

use explorer_app::state::OutputKind;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, BorderType, Borders};

use super::palette;

pub fn text_primary() -> Style {
    Style::default().fg(palette::TEXT_PRIMARY)
}

pub fn text_secondary() -> Style {
    Style::default().fg(palette::TEXT_SECONDARY)
}

pub fn text_muted() -> Style {
    Style::default().fg(palette::TEXT_MUTED)
}

pub fn accent_bold() -> Style {
    Style::default()
        .fg(palette::ACCENT)
        .add_modifier(Modifier::BOLD)
}

/// Highlighted row in a list
pub fn selected() -> Style {
    Style::default()
        .bg(palette::SELECTION_BG)
        .fg(palette::TEXT_PRIMARY)
        .add_modifier(Modifier::BOLD)
}

pub fn status_red() -> Style {
    Style::default().fg(palette::STATUS_RED)
}

pub fn status_yellow() -> Style {
    Style::default().fg(palette::STATUS_YELLOW)
}

pub fn status_green() -> Style {
    Style::default().fg(palette::STATUS_GREEN)
}

/// Rounded panel border, brighter while the panel has focus
pub fn panel_block(title: &str, focused: bool) -> Block<'static> {
    let border = if focused {
        Style::default().fg(palette::BORDER_ACTIVE)
    } else {
        Style::default().fg(palette::BORDER_DIM)
    };
    let title_style = if focused {
        accent_bold()
    } else {
        text_secondary()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border)
        .title(ratatui::text::Span::styled(format!(" {} ", title), title_style))
}

/// Style and tag for an output entry
pub fn output_kind(kind: OutputKind) -> (&'static str, Style) {
    match kind {
        OutputKind::Expression => ("EMIT", Style::default().fg(palette::OUTPUT_EXPRESSION)),
        OutputKind::Result => ("OK", Style::default().fg(palette::OUTPUT_RESULT)),
        OutputKind::Error => (
            "ERR",
            Style::default()
                .fg(palette::OUTPUT_ERROR)
                .add_modifier(Modifier::BOLD),
        ),
        OutputKind::Info => ("INFO", Style::default().fg(palette::OUTPUT_INFO)),
        OutputKind::Console => ("LOG", Style::default().fg(palette::OUTPUT_CONSOLE)),
    }
}
