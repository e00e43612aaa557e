//! Scrollback of emitted expressions, results, errors and console lines

use explorer_app::state::OutputEntry;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::theme::styles;

pub struct OutputPane<'a> {
    entries: &'a [OutputEntry],
    /// Entries scrolled up from the newest
    scroll: usize,
    focused: bool,
}

impl<'a> OutputPane<'a> {
    pub fn new(entries: &'a [OutputEntry]) -> Self {
        Self {
            entries,
            scroll: 0,
            focused: false,
        }
    }

    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

fn entry_lines(entry: &OutputEntry) -> Vec<Line<'static>> {
    let (tag, style) = styles::output_kind(entry.kind);
    let stamp = entry.timestamp.format("%H:%M:%S").to_string();
    // timestamp + space + 4-wide tag + space
    let pad = " ".repeat(stamp.len() + 6);

    entry
        .text
        .split('\n')
        .enumerate()
        .map(|(i, text)| {
            if i == 0 {
                Line::from(vec![
                    Span::styled(stamp.clone(), styles::text_muted()),
                    Span::raw(" "),
                    Span::styled(format!("{:<4}", tag), style),
                    Span::raw(" "),
                    Span::styled(text.to_string(), style),
                ])
            } else {
                Line::from(vec![
                    Span::raw(pad.clone()),
                    Span::styled(text.to_string(), style),
                ])
            }
        })
        .collect()
}

impl Widget for OutputPane<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = if self.scroll > 0 {
            format!("Output (+{} newer)", self.scroll)
        } else {
            "Output".to_string()
        };
        let block = styles::panel_block(&title, self.focused);
        let inner = block.inner(area);
        block.render(area, buf);

        if self.entries.is_empty() {
            Paragraph::new(Line::styled(
                "s: call   e: emit expression   r: reset form",
                styles::text_muted(),
            ))
            .render(inner, buf);
            return;
        }

        let end = self.entries.len().saturating_sub(self.scroll);
        let height = inner.height as usize;
        // newest entries fill the bottom of the pane
        let mut lines: Vec<Line> = Vec::new();
        for entry in self.entries[..end].iter().rev() {
            let mut chunk = entry_lines(entry);
            chunk.extend(lines);
            lines = chunk;
            if lines.len() >= height {
                break;
            }
        }
        let skip = lines.len().saturating_sub(height);
        let visible: Vec<Line> = lines.into_iter().skip(skip).collect();

        Paragraph::new(visible).render(inner, buf);
    }
}
