//! Headless command implementations
//!
//! Each command drives an [`Explorer`] the same way the TUI does and
//! returns the events to print. Call failures are events. Input problems
//! (unknown page, unreadable attachment) come back as `Err` and [`report`]
//! turns them into `error` events; anything else aborts the command.

use std::path::Path;
use std::sync::Arc;

use explorer_app::config::{init_config, Settings};
use explorer_app::{
    open_store, ConsoleSink, ControlKind, ExprEngine, Explorer, FormState, MemoryStore,
    PersistedFormState, StdoutSink,
};
use explorer_core::prelude::*;
use explorer_core::{find_ancestor_keys, find_node, label_path, Attachment, FormValue};

use crate::demo;
use crate::headless::{EventSink, HeadlessEvent, ParameterInfo};

/// A `--set name=value` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub name: String,
    pub value: String,
}

/// Parse `name=value`; the value may itself contain `=`
pub fn parse_assignment(raw: &str) -> std::result::Result<Assignment, String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing parameter name in '{}'", raw));
    }
    Ok(Assignment {
        name: name.to_string(),
        value: value.to_string(),
    })
}

/// Explorer over the demo catalog and loopback SDK
///
/// `ephemeral` keeps snapshots in memory regardless of `[storage]`.
pub fn build_explorer(
    settings: Settings,
    ephemeral: bool,
    console: Option<ConsoleSink>,
) -> Result<Explorer> {
    let store = if ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        open_store(&settings)
    };
    let engine = match console {
        Some(sink) => ExprEngine::new().with_console(sink),
        None => ExprEngine::new(),
    };
    Ok(Explorer::new(
        demo::catalog()?,
        demo::registry(),
        PersistedFormState::new(store),
        Arc::new(engine),
        settings,
    ))
}

/// Write `--set` values into a form; file pickers take a path
pub fn apply_assignments(form: &mut FormState, assignments: &[Assignment]) -> Result<()> {
    for Assignment { name, value } in assignments {
        let kind = form
            .control(name)
            .map(|c| c.kind)
            .ok_or_else(|| Error::unknown_parameter(name.as_str()))?;
        match kind {
            ControlKind::FilePicker => form.attach(name, Attachment::from_path(value)?)?,
            _ => form.set_value(name, FormValue::Text(value.clone()))?,
        }
    }
    Ok(())
}

pub fn list(explorer: &Explorer) -> Vec<HeadlessEvent> {
    explorer
        .catalog()
        .pages()
        .map(|page| {
            let parameters = page
                .schema
                .iter()
                .map(|p| ParameterInfo {
                    name: p.name.clone(),
                    kind: p.kind.to_string(),
                    default: p.default_value().to_json(),
                })
                .collect();
            HeadlessEvent::method(
                &page.key,
                &page.title,
                parameters,
                explorer.registry().contains(&page.key),
            )
        })
        .collect()
}

/// Open a page, apply `assignments`, submit
pub async fn call(
    explorer: &mut Explorer,
    method: &str,
    assignments: &[Assignment],
) -> Result<Vec<HeadlessEvent>> {
    let key = explorer.catalog().find(method)?.key.clone();
    let mut form = explorer.open_form(&key)?;
    apply_assignments(&mut form, assignments)?;

    let mut events = vec![HeadlessEvent::call_started(&key)];
    match explorer.submit(&mut form).await {
        Ok(report) => events.push(HeadlessEvent::from_report(&report)),
        Err(e) => {
            warn!("{} was not called: {}", key, e);
            events.push(HeadlessEvent::submit_failed(method, &e));
        }
    }
    Ok(events)
}

/// Print the call expression for a page; `raw` writes plain text instead
/// of an event
pub fn emit(
    explorer: &Explorer,
    method: &str,
    assignments: &[Assignment],
    raw: bool,
) -> Result<Vec<HeadlessEvent>> {
    let key = explorer.catalog().find(method)?.key.clone();
    let mut form = explorer.open_form(&key)?;
    apply_assignments(&mut form, assignments)?;

    if raw {
        return Ok(match explorer.emit_to(&form, &mut StdoutSink) {
            Ok(_) => Vec::new(),
            Err(e) => vec![HeadlessEvent::submit_failed(method, &e)],
        });
    }

    let mut sink = EventSink::default();
    match explorer.emit_to(&form, &mut sink) {
        Ok(_) => Ok(sink.events),
        Err(e) => Ok(vec![HeadlessEvent::submit_failed(method, &e)]),
    }
}

/// Parse a previously emitted expression and run it
pub async fn replay(explorer: &mut Explorer, text: &str) -> Vec<HeadlessEvent> {
    let prepared = match explorer.prepare_replay(text) {
        Ok(prepared) => prepared,
        Err(e) => return vec![HeadlessEvent::submit_failed("replay", &e)],
    };
    let mut events = vec![HeadlessEvent::call_started(prepared.key())];
    let settled = prepared.run().await;
    let report = explorer.complete(settled);
    events.push(HeadlessEvent::from_report(&report));
    events
}

pub fn reset(explorer: &Explorer, method: &str) -> Result<Vec<HeadlessEvent>> {
    let key = explorer.catalog().find(method)?.key.clone();
    let mut form = explorer.open_form(&key)?;
    explorer.reset(&mut form)?;
    Ok(vec![HeadlessEvent::form_reset(&key)])
}

/// Ancestor keys and breadcrumb labels of a menu entry
pub fn menu_find(explorer: &Explorer, key: &str) -> HeadlessEvent {
    let menu = explorer.catalog().menu();
    if find_node(menu, key).is_none() {
        return HeadlessEvent::error(format!("No menu entry '{}'", key));
    }
    HeadlessEvent::menu_path(key, find_ancestor_keys(menu, key), label_path(menu, key))
}

/// Turn a recoverable command error into an `error` event
///
/// Errors from user input (unknown page, bad value, unreadable attachment)
/// are reported like any other failure; everything else is returned.
pub fn report(result: Result<Vec<HeadlessEvent>>) -> Result<Vec<HeadlessEvent>> {
    match result {
        Err(e) if e.is_recoverable() => {
            warn!("Command failed: {}", e);
            Ok(vec![HeadlessEvent::error(e.to_string())])
        }
        other => other,
    }
}

pub fn init(config_path: &Path) -> Result<HeadlessEvent> {
    let created = init_config(config_path)?;
    if created {
        info!("Wrote default config to {}", config_path.display());
    }
    Ok(HeadlessEvent::config_initialized(config_path, created))
}
