//! Main update function - handles state transitions (TEA pattern)

use super::{form, keys::handle_key, menu, UpdateResult};
use crate::engine::Explorer;
use crate::message::Message;
use crate::state::{AppPhase, AppState, OutputKind};

/// Process a message and update state
/// Returns optional follow-up message and/or action
pub fn update(state: &mut AppState, explorer: &mut Explorer, message: Message) -> UpdateResult {
    match message {
        Message::Key(key) => match handle_key(state, key) {
            Some(msg) => UpdateResult::message(msg),
            None => UpdateResult::none(),
        },

        Message::Tick => UpdateResult::none(),

        Message::RequestQuit | Message::Quit => {
            state.phase = AppPhase::Quitting;
            UpdateResult::none()
        }

        Message::FocusNext => {
            state.focus = state.focus.next();
            UpdateResult::none()
        }
        Message::FocusPrev => {
            state.focus = state.focus.prev();
            UpdateResult::none()
        }

        // ─────────────────────────────────────────────────────────
        // Menu
        // ─────────────────────────────────────────────────────────
        Message::MenuUp => menu::handle_menu_up(state),
        Message::MenuDown => menu::handle_menu_down(state),
        Message::MenuActivate => menu::handle_menu_activate(state),
        Message::MenuCollapse => menu::handle_menu_collapse(state),
        Message::OpenPage(key) => menu::handle_open_page(state, explorer, key),

        // ─────────────────────────────────────────────────────────
        // Form
        // ─────────────────────────────────────────────────────────
        Message::FieldUp => form::handle_field_up(state),
        Message::FieldDown => form::handle_field_down(state),
        Message::BeginEdit => form::handle_begin_edit(state),
        Message::ToggleField => form::handle_toggle_field(state),
        Message::ClearField => form::handle_clear_field(state),
        Message::EditInput(c) => {
            if let Some(buffer) = state.editing.as_mut() {
                buffer.insert(c);
            }
            UpdateResult::none()
        }
        Message::EditNewline => {
            if let Some(buffer) = state.editing.as_mut() {
                buffer.insert('\n');
            }
            UpdateResult::none()
        }
        Message::EditBackspace => {
            if let Some(buffer) = state.editing.as_mut() {
                buffer.backspace();
            }
            UpdateResult::none()
        }
        Message::EditLeft => {
            if let Some(buffer) = state.editing.as_mut() {
                buffer.left();
            }
            UpdateResult::none()
        }
        Message::EditRight => {
            if let Some(buffer) = state.editing.as_mut() {
                buffer.right();
            }
            UpdateResult::none()
        }
        Message::EditCommit => form::handle_edit_commit(state),
        Message::EditCancel => {
            state.editing = None;
            UpdateResult::none()
        }

        // ─────────────────────────────────────────────────────────
        // Actions
        // ─────────────────────────────────────────────────────────
        Message::Submit => form::handle_submit(state, explorer),
        Message::Emit => form::handle_emit(state, explorer),
        Message::ResetForm => form::handle_reset(state, explorer),
        Message::CallSettled(settled) => form::handle_call_settled(state, explorer, *settled),
        Message::ConsoleLine(line) => {
            state.push_output(OutputKind::Console, line);
            UpdateResult::none()
        }

        // ─────────────────────────────────────────────────────────
        // Output pane
        // ─────────────────────────────────────────────────────────
        Message::OutputUp => {
            if state.output_scroll + 1 < state.output.len() {
                state.output_scroll += 1;
            }
            UpdateResult::none()
        }
        Message::OutputDown => {
            state.output_scroll = state.output_scroll.saturating_sub(1);
            UpdateResult::none()
        }
        Message::ClearOutput => {
            state.output.clear();
            state.output_scroll = 0;
            UpdateResult::none()
        }
    }
}
