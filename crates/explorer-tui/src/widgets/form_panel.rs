//! Form for the open method page

use explorer_app::state::EditBuffer;
use explorer_app::{ControlKind, FormState};
use explorer_core::FormValue;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

use super::truncate_to_width;
use crate::theme::styles;

pub struct FormPanel<'a> {
    form: Option<&'a FormState>,
    cursor: usize,
    editing: Option<&'a EditBuffer>,
    focused: bool,
    show_descriptions: bool,
    submitting: bool,
}

impl<'a> FormPanel<'a> {
    pub fn new(form: Option<&'a FormState>, cursor: usize) -> Self {
        Self {
            form,
            cursor,
            editing: None,
            focused: false,
            show_descriptions: true,
            submitting: false,
        }
    }

    pub fn editing(mut self, buffer: Option<&'a EditBuffer>) -> Self {
        self.editing = buffer;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn show_descriptions(mut self, show: bool) -> Self {
        self.show_descriptions = show;
        self
    }

    pub fn submitting(mut self, submitting: bool) -> Self {
        self.submitting = submitting;
        self
    }

    fn title(&self) -> String {
        match self.form {
            None => "Form".to_string(),
            Some(form) => {
                let mut title = form.key().to_string();
                if form.is_dirty() {
                    title.push_str(" *");
                }
                if self.submitting {
                    title.push_str(" (running)");
                }
                title
            }
        }
    }
}

/// One-line rendering of a stored value
fn value_summary(kind: ControlKind, value: Option<&FormValue>) -> String {
    match (kind, value) {
        (ControlKind::Toggle, Some(FormValue::Bool(true))) => "[x]".to_string(),
        (ControlKind::Toggle, _) => "[ ]".to_string(),
        (ControlKind::FilePicker, Some(FormValue::Attachments(files))) if !files.is_empty() => {
            let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
            format!("{} file(s): {}", files.len(), names.join(", "))
        }
        (ControlKind::FilePicker, _) => "(no files)".to_string(),
        (_, Some(value)) => {
            let text = value.display();
            let mut lines = text.lines();
            let first = lines.next().unwrap_or_default().to_string();
            if lines.next().is_some() {
                format!("{} …", first)
            } else {
                first
            }
        }
        (_, None) => String::new(),
    }
}

/// Edit buffer lines with the cursor cell reversed
fn edit_lines(buffer: &EditBuffer) -> Vec<Line<'static>> {
    let cursor_style = Style::default().add_modifier(Modifier::REVERSED);
    let mut lines = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut run = String::new();

    for (i, c) in buffer.text.chars().enumerate() {
        if i == buffer.cursor {
            current.push(Span::raw(std::mem::take(&mut run)));
            if c == '\n' {
                current.push(Span::styled(" ", cursor_style));
                lines.push(Line::from(std::mem::take(&mut current)));
            } else {
                current.push(Span::styled(c.to_string(), cursor_style));
            }
            continue;
        }
        if c == '\n' {
            current.push(Span::raw(std::mem::take(&mut run)));
            lines.push(Line::from(std::mem::take(&mut current)));
        } else {
            run.push(c);
        }
    }
    current.push(Span::raw(run));
    if buffer.cursor >= buffer.text.chars().count() {
        current.push(Span::styled(" ", cursor_style));
    }
    lines.push(Line::from(current));
    lines
}

impl Widget for FormPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = styles::panel_block(&self.title(), self.focused);
        let inner = block.inner(area);
        block.render(area, buf);

        let Some(form) = self.form else {
            Paragraph::new(Line::styled(
                "Select a method in the menu",
                styles::text_muted(),
            ))
            .render(inner, buf);
            return;
        };

        if form.controls().is_empty() {
            Paragraph::new(Line::styled(
                "This method takes no parameters. Press s to call it.",
                styles::text_muted(),
            ))
            .render(inner, buf);
            return;
        }

        let label_width = form
            .controls()
            .iter()
            .map(|c| c.label.chars().count())
            .max()
            .unwrap_or(0)
            .min(24);
        let value_width = (inner.width as usize).saturating_sub(label_width + 4);

        let mut lines: Vec<Line> = Vec::new();
        let mut selected_line = 0;
        for (index, control) in form.controls().iter().enumerate() {
            let selected = index == self.cursor;
            if selected {
                selected_line = lines.len();
            }
            let pointer = if selected { "▶ " } else { "  " };
            let label_style = if selected {
                styles::accent_bold()
            } else {
                styles::text_secondary()
            };
            let label = format!("{:<width$}", control.label, width = label_width);

            let editing = self.editing.filter(|b| selected && b.field == control.name);
            match editing {
                Some(buffer) => {
                    let mut edit = edit_lines(buffer).into_iter();
                    let mut first = vec![
                        Span::raw(pointer),
                        Span::styled(label, label_style),
                        Span::raw("  "),
                    ];
                    if let Some(line) = edit.next() {
                        first.extend(line.spans);
                    }
                    lines.push(Line::from(first));
                    let pad = " ".repeat(label_width + 4);
                    for line in edit {
                        let mut spans = vec![Span::raw(pad.clone())];
                        spans.extend(line.spans);
                        lines.push(Line::from(spans));
                    }
                }
                None => {
                    let summary = value_summary(control.kind, form.value(&control.name));
                    lines.push(Line::from(vec![
                        Span::raw(pointer),
                        Span::styled(label, label_style),
                        Span::raw("  "),
                        Span::styled(truncate_to_width(&summary, value_width), styles::text_primary()),
                    ]));
                }
            }

            if selected {
                let pad = " ".repeat(label_width + 4);
                if self.show_descriptions {
                    if let Some(description) = &control.description {
                        lines.push(Line::from(vec![
                            Span::raw(pad.clone()),
                            Span::styled(description.clone(), styles::text_muted()),
                        ]));
                    }
                }
                lines.push(Line::from(vec![
                    Span::raw(pad),
                    Span::styled(
                        format!("{} · {}", control.param_kind, control.kind.hint()),
                        styles::text_muted().add_modifier(Modifier::ITALIC),
                    ),
                ]));
            }
        }

        let height = inner.height as usize;
        let offset = selected_line.saturating_sub(height.saturating_sub(3));
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((offset as u16, 0))
            .render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_form, TestTerminal};
    use explorer_core::Attachment;

    #[test]
    fn test_empty_form_prompts_for_selection() {
        let mut term = TestTerminal::with_size(60, 6);
        term.render_widget(FormPanel::new(None, 0), term.area());
        assert!(term.buffer_contains("Select a method in the menu"));
    }

    #[test]
    fn test_form_lists_controls_and_values() {
        let form = test_form();
        let mut term = TestTerminal::with_size(80, 20);

        term.render_widget(FormPanel::new(Some(&form), 0), term.area());

        assert!(term.buffer_contains("im.sendText"));
        assert!(term.buffer_contains("alice"));
        assert!(term.buffer_contains("hello"));
        assert!(term.buffer_contains("[ ]"));
        assert!(term.buffer_contains("(no files)"));
        assert!(term.buffer_contains("{\"a\":1}"));
        assert!(term.buffer_contains("return function(r) { return r; }"));
    }

    #[test]
    fn test_selected_control_shows_description_and_hint() {
        let form = test_form();
        let mut term = TestTerminal::with_size(80, 20);

        term.render_widget(FormPanel::new(Some(&form), 0), term.area());

        assert!(term.buffer_contains("▶ to"));
        assert!(term.buffer_contains("Recipient user id"));
        assert!(term.buffer_contains("text · text"));
    }

    #[test]
    fn test_descriptions_can_be_hidden() {
        let form = test_form();
        let mut term = TestTerminal::with_size(80, 20);

        term.render_widget(
            FormPanel::new(Some(&form), 0).show_descriptions(false),
            term.area(),
        );

        assert!(!term.buffer_contains("Recipient user id"));
    }

    #[test]
    fn test_dirty_and_running_markers_in_title() {
        let mut form = test_form();
        form.set_text("to", "bob").unwrap();
        let mut term = TestTerminal::with_size(80, 20);

        term.render_widget(
            FormPanel::new(Some(&form), 0).submitting(true),
            term.area(),
        );

        assert!(term.buffer_contains("im.sendText * (running)"));
        assert!(term.buffer_contains("bob"));
    }

    #[test]
    fn test_edit_buffer_replaces_value() {
        let form = test_form();
        let buffer = EditBuffer::new("text", "draft", false);
        let mut term = TestTerminal::with_size(80, 20);

        term.render_widget(
            FormPanel::new(Some(&form), 1).editing(Some(&buffer)),
            term.area(),
        );

        assert!(term.buffer_contains("draft"));
        assert!(!term.buffer_contains("hello"));
    }

    #[test]
    fn test_attachments_are_summarized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, b"png").unwrap();

        let mut form = test_form();
        form.attach("files", Attachment::from_path(&path).unwrap())
            .unwrap();
        let mut term = TestTerminal::with_size(80, 20);

        term.render_widget(FormPanel::new(Some(&form), 0), term.area());

        assert!(term.buffer_contains("1 file(s): photo.png"));
    }

    #[test]
    fn test_multiline_edit_spans_rows() {
        let buffer = EditBuffer::new("extra", "{\n  \"a\": 1\n}", true);
        let lines = edit_lines(&buffer);
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_value_summary_marks_multiline_text() {
        let value = FormValue::text("line one\nline two");
        assert_eq!(
            value_summary(ControlKind::DataEditor, Some(&value)),
            "line one …"
        );
    }
}
