//! Submit, emit and replay flows
//!
//! [`Explorer`] owns everything a method page needs: the catalog, the SDK
//! registry, the global reference registry, snapshot persistence and the
//! script engine. Submission is split in three steps so a front end can
//! await the call off its event loop:
//!
//! 1. [`Explorer::prepare_submit`] serializes (Execute) and resolves the method
//! 2. [`PreparedCall::run`] invokes it, owning everything it needs
//! 3. [`Explorer::complete`] stores the result and persists the raw values
//!
//! [`Explorer::submit`] runs all three in sequence.

use std::sync::Arc;

use explorer_core::prelude::*;
use explorer_core::{FormKey, FormValueMap, LiveValue};
use thiserror::Error;

use crate::config::{Settings, StorageBackend};
use crate::form::FormState;
use crate::globals::GlobalRegistry;
use crate::invocation::{invoke, Outcome};
use crate::page::{Catalog, PageSpec};
use crate::persistence::{FileStore, KeyValueStore, MemoryStore, PersistedFormState};
use crate::registry::{SdkMethod, SdkRegistry};
use crate::script::ScriptEngine;
use crate::serializer::call_expr::{assemble, parse_call_expression, ExpressionError};
use crate::serializer::{execute_args, output_args, SerializeContext, SerializeError};
use crate::sink::OutputSink;

/// Why a submit or emit never reached the SDK
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Serialize(#[from] SerializeError),

    #[error("No SDK method registered for {namespace}.{method}")]
    MethodNotFound { namespace: String, method: String },

    #[error("Invalid call expression: {0}")]
    Expression(#[from] ExpressionError),

    #[error("Could not write output: {message}")]
    Output { message: String },
}

impl SubmitError {
    fn method_not_found(key: &FormKey) -> Self {
        Self::MethodNotFound {
            namespace: key.namespace.clone(),
            method: key.method.clone(),
        }
    }
}

/// A resolved call, ready to run off the UI thread
pub struct PreparedCall {
    key: FormKey,
    method: Arc<dyn SdkMethod>,
    args: Vec<LiveValue>,
    values: Option<FormValueMap>,
    store_as: Option<String>,
}

impl PreparedCall {
    pub fn key(&self) -> &FormKey {
        &self.key
    }

    pub fn args(&self) -> &[LiveValue] {
        &self.args
    }

    /// Invoke the method and wait for it to settle
    pub async fn run(self) -> SettledCall {
        let Self {
            key,
            method,
            args,
            values,
            store_as,
        } = self;
        debug!("Invoking {} with {} argument(s)", key, args.len());
        let outcome = invoke(move || method.call(args)).await;
        SettledCall {
            key,
            values,
            store_as,
            outcome,
        }
    }
}

impl std::fmt::Debug for PreparedCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedCall")
            .field("key", &self.key)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

/// A call that has settled but whose side effects are not applied yet
#[derive(Debug)]
pub struct SettledCall {
    pub key: FormKey,
    /// Raw form values to persist; `None` for replayed expressions
    pub values: Option<FormValueMap>,
    pub store_as: Option<String>,
    pub outcome: Outcome,
}

/// What a finished submit did
#[derive(Debug, Clone, PartialEq)]
pub struct CallReport {
    pub key: FormKey,
    pub outcome: Outcome,
    /// Global identifier the result was stored under
    pub stored_as: Option<String>,
}

/// Build the snapshot store selected in `[storage]`
pub fn open_store(settings: &Settings) -> Arc<dyn KeyValueStore> {
    match settings.storage.backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::File => {
            match settings.storage.dir.clone().or_else(FileStore::default_dir) {
                Some(dir) => Arc::new(FileStore::new(dir)),
                None => {
                    warn!("No data directory available, form values will not survive a restart");
                    Arc::new(MemoryStore::new())
                }
            }
        }
    }
}

pub struct Explorer {
    catalog: Catalog,
    registry: SdkRegistry,
    globals: GlobalRegistry,
    persisted: PersistedFormState,
    script: Arc<dyn ScriptEngine>,
    settings: Settings,
}

impl Explorer {
    pub fn new(
        catalog: Catalog,
        registry: SdkRegistry,
        persisted: PersistedFormState,
        script: Arc<dyn ScriptEngine>,
        settings: Settings,
    ) -> Self {
        for page in catalog.pages() {
            if !registry.contains(&page.key) {
                warn!("Page {} has no registered SDK method", page.key);
            }
        }
        Self {
            catalog,
            registry,
            globals: GlobalRegistry::new(),
            persisted,
            script,
            settings,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn registry(&self) -> &SdkRegistry {
        &self.registry
    }

    pub fn globals(&self) -> &GlobalRegistry {
        &self.globals
    }

    pub fn globals_mut(&mut self) -> &mut GlobalRegistry {
        &mut self.globals
    }

    pub fn persisted(&self) -> &PersistedFormState {
        &self.persisted
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn script_engine(&self) -> &dyn ScriptEngine {
        self.script.as_ref()
    }

    pub fn page(&self, key: &FormKey) -> Result<&PageSpec> {
        self.catalog
            .get(key)
            .ok_or_else(|| Error::page_not_found(key.to_string()))
    }

    /// Mount the form for `key`, seeded from its stored snapshot
    pub fn open_form(&self, key: &FormKey) -> Result<FormState> {
        let page = self.page(key)?;
        Ok(FormState::mount(page, &self.persisted))
    }

    pub fn serialize_context(&self) -> SerializeContext<'_> {
        SerializeContext::new(&self.globals, self.script.as_ref())
            .with_accessor(&self.settings.output.global_accessor)
    }

    /// Serialize `form` for execution and resolve its method
    ///
    /// On a serialization failure the raw values are still persisted
    /// (unless disabled in `[behavior]`), then the error is returned.
    pub fn prepare_submit(&self, form: &FormState) -> std::result::Result<PreparedCall, SubmitError> {
        let key = form.key().clone();
        let args = match execute_args(form.schema(), form.values(), &self.serialize_context()) {
            Ok(args) => args,
            Err(e) => {
                warn!("Not calling {}: {}", key, e);
                if self.settings.behavior.persist_on_serialize_error {
                    self.persist(&key, form.values());
                }
                return Err(e.into());
            }
        };

        let method = self
            .registry
            .get(&key)
            .ok_or_else(|| SubmitError::method_not_found(&key))?;
        let store_as = self
            .catalog
            .get(&key)
            .and_then(|page| page.store_result_as.clone());

        Ok(PreparedCall {
            key,
            method,
            args,
            values: Some(form.values().clone()),
            store_as,
        })
    }

    /// Apply a settled call: store the result, persist the raw values
    pub fn complete(&mut self, settled: SettledCall) -> CallReport {
        let SettledCall {
            key,
            values,
            store_as,
            outcome,
        } = settled;

        let stored_as = match (&outcome, store_as) {
            (Ok(value), Some(identifier)) if self.settings.behavior.store_results => {
                self.globals.insert(identifier.clone(), value.clone());
                Some(identifier)
            }
            _ => None,
        };

        match &outcome {
            Ok(value) => info!("{} returned {}", key, value),
            Err(e) => warn!("{} failed: {}", key, e),
        }

        if let Some(values) = values {
            self.persist(&key, &values);
        }

        CallReport {
            key,
            outcome,
            stored_as,
        }
    }

    /// Serialize, invoke, store and persist in one go
    pub async fn submit(&mut self, form: &mut FormState) -> std::result::Result<CallReport, SubmitError> {
        let prepared = self.prepare_submit(form)?;
        let settled = prepared.run().await;
        form.mark_clean();
        Ok(self.complete(settled))
    }

    /// The copy-pasteable call expression for `form`
    pub fn emit(&self, form: &FormState) -> std::result::Result<String, SubmitError> {
        let literals = output_args(form.schema(), form.values(), &self.serialize_context())?;
        Ok(assemble(
            form.key(),
            &literals,
            &self.settings.output.argument_separator,
        ))
    }

    /// Emit `form` and hand the text to `sink`
    pub fn emit_to(
        &self,
        form: &FormState,
        sink: &mut dyn OutputSink,
    ) -> std::result::Result<String, SubmitError> {
        let text = self.emit(form)?;
        sink.write_expression(form.key(), &text)
            .map_err(|e| SubmitError::Output {
                message: e.to_string(),
            })?;
        info!("Emitted {}", text);
        Ok(text)
    }

    /// Parse a previously emitted expression and resolve its method
    pub fn prepare_replay(&self, text: &str) -> std::result::Result<PreparedCall, SubmitError> {
        let expr = parse_call_expression(text, &self.settings.output.global_accessor)?;
        let args = expr.evaluate(&self.serialize_context())?;
        let method = self
            .registry
            .get(&expr.key)
            .ok_or_else(|| SubmitError::method_not_found(&expr.key))?;
        let store_as = self
            .catalog
            .get(&expr.key)
            .and_then(|page| page.store_result_as.clone());

        Ok(PreparedCall {
            key: expr.key,
            method,
            args,
            values: None,
            store_as,
        })
    }

    /// Run a previously emitted expression
    pub async fn replay(&mut self, text: &str) -> std::result::Result<CallReport, SubmitError> {
        let prepared = self.prepare_replay(text)?;
        let settled = prepared.run().await;
        Ok(self.complete(settled))
    }

    /// Restore `form` to its defaults and forget its snapshot
    pub fn reset(&self, form: &mut FormState) -> Result<()> {
        form.reset(&self.persisted)
    }

    fn persist(&self, key: &FormKey, values: &FormValueMap) {
        if let Err(e) = self.persisted.save(key, values) {
            warn!("Could not save form values for {}: {}", key, e);
        }
    }
}
