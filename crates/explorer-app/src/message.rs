//! Message types for the application (TEA pattern)

use explorer_core::FormKey;

use crate::engine::SettledCall;
use crate::input_key::InputKey;

#[derive(Debug)]
pub enum Message {
    /// Keyboard event from the terminal
    Key(InputKey),

    /// Periodic redraw
    Tick,

    RequestQuit,
    Quit,

    // ─────────────────────────────────────────────────────────
    // Focus
    // ─────────────────────────────────────────────────────────
    FocusNext,
    FocusPrev,

    // ─────────────────────────────────────────────────────────
    // Menu
    // ─────────────────────────────────────────────────────────
    MenuUp,
    MenuDown,
    /// Expand/collapse a branch, or open the page behind a leaf
    MenuActivate,
    MenuCollapse,
    /// Open a page and reveal it in the menu
    OpenPage(FormKey),

    // ─────────────────────────────────────────────────────────
    // Form
    // ─────────────────────────────────────────────────────────
    FieldUp,
    FieldDown,
    /// Start editing the selected control (toggles flip instead)
    BeginEdit,
    ToggleField,
    /// Empty the selected control (file pickers drop their attachments)
    ClearField,
    EditInput(char),
    EditNewline,
    EditBackspace,
    EditLeft,
    EditRight,
    EditCommit,
    EditCancel,

    // ─────────────────────────────────────────────────────────
    // Actions
    // ─────────────────────────────────────────────────────────
    Submit,
    Emit,
    ResetForm,

    /// A submitted call settled in the background
    CallSettled(Box<SettledCall>),

    /// `console.log` output of a compiled callback
    ConsoleLine(String),

    // ─────────────────────────────────────────────────────────
    // Output pane
    // ─────────────────────────────────────────────────────────
    OutputUp,
    OutputDown,
    ClearOutput,
}
