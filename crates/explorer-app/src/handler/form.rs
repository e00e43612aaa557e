//! Form editing and submit/emit handlers

use explorer_core::prelude::*;
use explorer_core::Attachment;

use super::{UpdateAction, UpdateResult};
use crate::engine::{Explorer, SettledCall};
use crate::form::ControlKind;
use crate::state::{AppState, EditBuffer, OutputKind};

fn selected_control(state: &AppState) -> Option<(String, ControlKind)> {
    let form = state.form.as_ref()?;
    form.controls()
        .get(state.field_cursor)
        .map(|c| (c.name.clone(), c.kind))
}

fn report(state: &mut AppState, result: Result<()>) {
    if let Err(e) = result {
        state.push_output(OutputKind::Error, e.to_string());
    }
}

pub fn handle_field_up(state: &mut AppState) -> UpdateResult {
    state.field_cursor = state.field_cursor.saturating_sub(1);
    UpdateResult::none()
}

pub fn handle_field_down(state: &mut AppState) -> UpdateResult {
    let count = state.form.as_ref().map_or(0, |f| f.controls().len());
    if state.field_cursor + 1 < count {
        state.field_cursor += 1;
    }
    UpdateResult::none()
}

pub fn handle_begin_edit(state: &mut AppState) -> UpdateResult {
    let Some((name, kind)) = selected_control(state) else {
        return UpdateResult::none();
    };
    match kind {
        ControlKind::Toggle => return handle_toggle_field(state),
        // File pickers take a path to attach
        ControlKind::FilePicker => {
            state.editing = Some(EditBuffer::new(name, "", false));
        }
        _ => {
            let current = state
                .form
                .as_ref()
                .and_then(|f| f.value(&name))
                .map(|v| v.display())
                .unwrap_or_default();
            state.editing = Some(EditBuffer::new(name, current, kind.is_multiline()));
        }
    }
    UpdateResult::none()
}

pub fn handle_toggle_field(state: &mut AppState) -> UpdateResult {
    let Some((name, ControlKind::Toggle)) = selected_control(state) else {
        return UpdateResult::none();
    };
    if let Some(form) = state.form.as_mut() {
        let result = form.toggle(&name).map(|_| ());
        report(state, result);
    }
    UpdateResult::none()
}

pub fn handle_clear_field(state: &mut AppState) -> UpdateResult {
    let Some((name, kind)) = selected_control(state) else {
        return UpdateResult::none();
    };
    if let Some(form) = state.form.as_mut() {
        let result = match kind {
            ControlKind::FilePicker => form.clear_attachments(&name),
            ControlKind::Toggle => Ok(()),
            _ => form.set_text(&name, ""),
        };
        report(state, result);
    }
    UpdateResult::none()
}

pub fn handle_edit_commit(state: &mut AppState) -> UpdateResult {
    let Some(buffer) = state.editing.take() else {
        return UpdateResult::none();
    };
    let Some(form) = state.form.as_mut() else {
        return UpdateResult::none();
    };

    let is_picker = form
        .control(&buffer.field)
        .is_some_and(|c| c.kind == ControlKind::FilePicker);
    let result = if is_picker {
        let path = buffer.text.trim();
        if path.is_empty() {
            Ok(())
        } else {
            Attachment::from_path(path).and_then(|a| form.attach(&buffer.field, a))
        }
    } else {
        form.set_text(&buffer.field, buffer.text)
    };
    report(state, result);
    UpdateResult::none()
}

pub fn handle_submit(state: &mut AppState, explorer: &Explorer) -> UpdateResult {
    if let Some(key) = &state.submitting {
        debug!("Ignoring submit while {} is in flight", key);
        return UpdateResult::none();
    }
    let Some(form) = state.form.as_ref() else {
        return UpdateResult::none();
    };

    match explorer.prepare_submit(form) {
        Ok(prepared) => {
            let key = prepared.key().clone();
            state.push_output(OutputKind::Info, format!("Calling {}", key));
            state.submitting = Some(key);
            UpdateResult::action(UpdateAction::SpawnCall(prepared))
        }
        Err(e) => {
            state.push_output(OutputKind::Error, e.to_string());
            UpdateResult::none()
        }
    }
}

pub fn handle_call_settled(
    state: &mut AppState,
    explorer: &mut Explorer,
    settled: SettledCall,
) -> UpdateResult {
    let report = explorer.complete(settled);
    state.submitting = None;

    if let Some(form) = state.form.as_mut() {
        if form.key() == &report.key {
            form.mark_clean();
        }
    }

    match &report.outcome {
        Ok(value) => {
            state.push_output(OutputKind::Result, format!("{} → {}", report.key, value));
            if let Some(identifier) = &report.stored_as {
                state.push_output(
                    OutputKind::Info,
                    format!("Stored as [[{}]]", identifier),
                );
            }
        }
        Err(e) => {
            let text = match &e.code {
                Some(code) => format!("{} failed [{}]: {}", report.key, code, e.message),
                None => format!("{} failed: {}", report.key, e.message),
            };
            state.push_output(OutputKind::Error, text);
        }
    }
    UpdateResult::none()
}

pub fn handle_emit(state: &mut AppState, explorer: &Explorer) -> UpdateResult {
    let Some(form) = state.form.as_ref() else {
        return UpdateResult::none();
    };
    match explorer.emit(form) {
        Ok(text) => {
            info!("Emitted {}", text);
            state.push_output(OutputKind::Expression, text);
        }
        Err(e) => state.push_output(OutputKind::Error, e.to_string()),
    }
    UpdateResult::none()
}

pub fn handle_reset(state: &mut AppState, explorer: &Explorer) -> UpdateResult {
    let Some(form) = state.form.as_mut() else {
        return UpdateResult::none();
    };
    let key = form.key().clone();
    let result = explorer.reset(form);
    state.editing = None;
    match result {
        Ok(()) => state.push_output(OutputKind::Info, format!("Reset {}", key)),
        Err(e) => state.push_output(OutputKind::Error, e.to_string()),
    }
    UpdateResult::none()
}
