//! Menu navigation handlers

use explorer_core::prelude::*;
use explorer_core::{find_ancestor_keys, FormKey};

use super::UpdateResult;
use crate::engine::Explorer;
use crate::message::Message;
use crate::state::{AppState, Focus, OutputKind};

pub fn handle_menu_up(state: &mut AppState) -> UpdateResult {
    state.menu_cursor = state.menu_cursor.saturating_sub(1);
    UpdateResult::none()
}

pub fn handle_menu_down(state: &mut AppState) -> UpdateResult {
    let rows = state.visible_menu().len();
    if state.menu_cursor + 1 < rows {
        state.menu_cursor += 1;
    }
    UpdateResult::none()
}

pub fn handle_menu_activate(state: &mut AppState) -> UpdateResult {
    let Some(row) = state.selected_row() else {
        return UpdateResult::none();
    };
    if row.has_children {
        if !state.expanded.remove(&row.key) {
            state.expanded.insert(row.key);
        }
        return UpdateResult::none();
    }
    match FormKey::parse(&row.key) {
        Ok(key) => UpdateResult::message(Message::OpenPage(key)),
        Err(e) => {
            state.push_output(OutputKind::Error, e.to_string());
            UpdateResult::none()
        }
    }
}

/// Collapse the selected branch, or jump to the parent of a leaf
pub fn handle_menu_collapse(state: &mut AppState) -> UpdateResult {
    let Some(row) = state.selected_row() else {
        return UpdateResult::none();
    };
    if row.expanded {
        state.expanded.remove(&row.key);
    } else if let Some(parent) = find_ancestor_keys(&state.menu, &row.key).pop() {
        state.expanded.remove(&parent);
        state.select_menu_key(&parent);
    }
    UpdateResult::none()
}

/// Mount the form for `key` and reveal it in the menu
pub fn handle_open_page(state: &mut AppState, explorer: &Explorer, key: FormKey) -> UpdateResult {
    let form = match explorer.open_form(&key) {
        Ok(form) => form,
        Err(e) => {
            warn!("Cannot open {}: {}", key, e);
            state.push_output(OutputKind::Error, e.to_string());
            return UpdateResult::none();
        }
    };

    let menu_key = key.storage_key();
    for ancestor in find_ancestor_keys(&state.menu, &menu_key) {
        state.expanded.insert(ancestor);
    }
    state.select_menu_key(&menu_key);

    state.form = Some(form);
    state.field_cursor = 0;
    state.editing = None;
    state.focus = Focus::Form;
    debug!("Opened page {}", key);
    UpdateResult::none()
}
