//! Test utilities for TUI rendering verification
//!
//! Widgets and full frames are rendered into ratatui's `TestBackend` and
//! asserted on as plain text.

use std::sync::Arc;

use explorer_app::config::{Settings, UiSettings};
use explorer_app::page::PageSpec;
use explorer_app::{
    AppState, Catalog, Deferred, ExprEngine, Explorer, FormState, PersistedFormState, SdkRegistry,
    Thrown,
};
use explorer_core::{
    FormValueMap, LiveValue, MenuNode, ParameterDescriptor as P, ParameterSchema,
};
use ratatui::backend::TestBackend;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::Widget;
use ratatui::Frame;
use ratatui::Terminal;

pub const TEST_WIDTH: u16 = 100;
pub const TEST_HEIGHT: u16 = 30;

/// Wrapper around a `TestBackend` terminal
pub struct TestTerminal {
    pub terminal: Terminal<TestBackend>,
}

impl TestTerminal {
    pub fn new() -> Self {
        Self::with_size(TEST_WIDTH, TEST_HEIGHT)
    }

    pub fn with_size(width: u16, height: u16) -> Self {
        let backend = TestBackend::new(width, height);
        let terminal = Terminal::new(backend).expect("Failed to create test terminal");
        Self { terminal }
    }

    pub fn area(&self) -> Rect {
        let size = self.terminal.size().expect("Failed to get terminal size");
        Rect::new(0, 0, size.width, size.height)
    }

    pub fn render_widget<W: Widget>(&mut self, widget: W, area: Rect) {
        self.terminal
            .draw(|frame| frame.render_widget(widget, area))
            .expect("Failed to render widget");
    }

    /// Draw a full frame, e.g. with `render::view`
    pub fn draw_with<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Frame),
    {
        self.terminal.draw(f).expect("Failed to draw frame");
    }

    pub fn buffer(&self) -> &Buffer {
        self.terminal.backend().buffer()
    }

    pub fn buffer_contains(&self, text: &str) -> bool {
        buffer_to_string(self.buffer()).contains(text)
    }

    pub fn line_contains(&self, line: u16, text: &str) -> bool {
        get_line_content(self.buffer(), line).contains(text)
    }

    /// Row index of the first line containing `text`
    pub fn find_line(&self, text: &str) -> Option<u16> {
        let height = self.buffer().area.height;
        (0..height).find(|y| self.line_contains(*y, text))
    }

    pub fn content(&self) -> String {
        buffer_to_string(self.buffer())
    }
}

impl Default for TestTerminal {
    fn default() -> Self {
        Self::new()
    }
}

fn buffer_to_string(buffer: &Buffer) -> String {
    let mut result = String::new();
    for y in 0..buffer.area.height {
        result.push_str(&get_line_content(buffer, y));
        result.push('\n');
    }
    result
}

fn get_line_content(buffer: &Buffer, line: u16) -> String {
    let mut result = String::new();
    if line < buffer.area.height {
        for x in 0..buffer.area.width {
            result.push_str(buffer[(x, line)].symbol());
        }
    }
    result
}

pub fn test_menu() -> Vec<MenuNode> {
    vec![
        MenuNode::branch(
            "im",
            "Messaging",
            vec![
                MenuNode::leaf("im.sendText", "Send text"),
                MenuNode::leaf("im.createConversation", "Create conversation"),
            ],
        ),
        MenuNode::branch("group", "Groups", vec![MenuNode::leaf("group.join", "Join")]),
    ]
}

pub fn test_page() -> PageSpec {
    PageSpec::new(
        "im",
        "sendText",
        ParameterSchema::new(vec![
            P::text("to").default("alice").description("Recipient user id"),
            P::text("text").default("hello"),
            P::boolean("silent"),
            P::binary("files"),
            P::structured("extra").default("{\"a\":1}"),
            P::callback("onAck").default("return function(r) { return r; }"),
        ])
        .expect("valid schema"),
    )
    .title("Send a text message")
}

pub fn test_form() -> FormState {
    FormState::with_values(&test_page(), FormValueMap::new())
}

/// Explorer whose `im.sendText` echoes its first argument
///
/// Its page has no file picker, so it submits without attachments.
pub fn test_explorer() -> Explorer {
    let mut catalog = Catalog::new(test_menu());
    catalog.add(
        PageSpec::new(
            "im",
            "sendText",
            ParameterSchema::new(vec![
                P::text("to").default("alice"),
                P::text("text").default("hello"),
                P::callback("onAck").default("return function(r) { return r; }"),
            ])
            .expect("valid schema"),
        )
        .store_result_as("lastText"),
    );

    let mut registry = SdkRegistry::new();
    registry.register(
        "im",
        "sendText",
        |args: Vec<LiveValue>| -> std::result::Result<Deferred, Thrown> {
            let to = args.into_iter().next().unwrap_or_default();
            Ok(Deferred::pending(async move { Ok(to) }))
        },
    );

    Explorer::new(
        catalog,
        registry,
        PersistedFormState::in_memory(),
        Arc::new(ExprEngine::new()),
        Settings::default(),
    )
}

/// State with the test menu and nothing open
pub fn create_test_state() -> AppState {
    AppState::new(test_menu(), UiSettings::default())
}

/// State with the `im.sendText` form open
pub fn create_state_with_form() -> AppState {
    let mut state = create_test_state();
    state.expanded.insert("im".to_string());
    state.select_menu_key("im.sendText");
    state.form = Some(test_form());
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_creation() {
        let term = TestTerminal::new();
        assert_eq!(term.area().width, TEST_WIDTH);
        assert_eq!(term.area().height, TEST_HEIGHT);
    }

    #[test]
    fn test_buffer_contains_and_find_line() {
        use ratatui::widgets::Paragraph;

        let mut term = TestTerminal::with_size(20, 3);
        term.render_widget(Paragraph::new("first\nsecond"), term.area());

        assert!(term.buffer_contains("second"));
        assert!(!term.buffer_contains("third"));
        assert_eq!(term.find_line("second"), Some(1));
    }

    #[test]
    fn test_fixture_form_has_all_controls() {
        let state = create_state_with_form();
        assert_eq!(state.form.as_ref().unwrap().controls().len(), 6);
        assert_eq!(state.selected_row().unwrap().key, "im.sendText");
    }
}
