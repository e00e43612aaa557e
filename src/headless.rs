//! Headless mode - NDJSON event output for the non-TUI commands
//!
//! Every command except `tui` reports what it did as newline-delimited JSON
//! on stdout, one event per line, so scripts can drive the explorer without
//! parsing terminal output.
//!
//! ```json
//! {"event":"call_started","key":"im.sendText","timestamp":1704700001000}
//! {"event":"call_succeeded","key":"im.sendText","result":{"id":"msg-1"},"stored_as":"lastMessage","timestamp":1704700001150}
//! ```

use std::io::{self, Write};

use chrono::Utc;
use explorer_app::{CallReport, OutputSink, SubmitError};
use explorer_core::prelude::*;
use explorer_core::FormKey;
use serde::Serialize;
use serde_json::Value;

/// One declared parameter in a `method` event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterInfo {
    pub name: String,
    pub kind: String,
    pub default: Value,
}

/// Events emitted by headless commands
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HeadlessEvent {
    /// A page in the catalog
    Method {
        key: String,
        title: String,
        parameters: Vec<ParameterInfo>,
        registered: bool,
        timestamp: i64,
    },

    CallStarted { key: String, timestamp: i64 },

    CallSucceeded {
        key: String,
        result: Value,
        stored_as: Option<String>,
        timestamp: i64,
    },

    CallFailed {
        key: String,
        message: String,
        code: Option<String>,
        detail: Option<Value>,
        timestamp: i64,
    },

    /// Emitted call expression
    Expression {
        key: String,
        text: String,
        timestamp: i64,
    },

    /// `console.log` from a callback
    Console { line: String, timestamp: i64 },

    FormReset { key: String, timestamp: i64 },

    /// Result of a menu lookup
    MenuPath {
        key: String,
        ancestors: Vec<String>,
        labels: Vec<String>,
        timestamp: i64,
    },

    ConfigInitialized {
        path: String,
        created: bool,
        timestamp: i64,
    },

    /// The command could not run
    Error { message: String, timestamp: i64 },
}

impl HeadlessEvent {
    /// Write this event to stdout as one JSON line
    pub fn emit(&self) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize headless event: {}", e);
                return;
            }
        };

        let mut stdout = io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", json) {
            error!("Failed to write headless event to stdout: {}", e);
            return;
        }
        if let Err(e) = stdout.flush() {
            error!("Failed to flush headless stdout: {}", e);
        }
    }

    /// Whether this event should make the process exit non-zero
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::CallFailed { .. } | Self::Error { .. })
    }

    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }

    // ─────────────────────────────────────────────────────────
    // Convenience constructors
    // ─────────────────────────────────────────────────────────

    pub fn method(
        key: &FormKey,
        title: &str,
        parameters: Vec<ParameterInfo>,
        registered: bool,
    ) -> Self {
        Self::Method {
            key: key.to_string(),
            title: title.to_string(),
            parameters,
            registered,
            timestamp: Self::now(),
        }
    }

    pub fn call_started(key: &FormKey) -> Self {
        Self::CallStarted {
            key: key.to_string(),
            timestamp: Self::now(),
        }
    }

    /// Success or failure event for a finished call
    pub fn from_report(report: &CallReport) -> Self {
        match &report.outcome {
            Ok(value) => Self::CallSucceeded {
                key: report.key.to_string(),
                result: value.to_json(),
                stored_as: report.stored_as.clone(),
                timestamp: Self::now(),
            },
            Err(e) => Self::CallFailed {
                key: report.key.to_string(),
                message: e.message.clone(),
                code: e.code.clone(),
                detail: e.detail.clone(),
                timestamp: Self::now(),
            },
        }
    }

    /// A call that never reached the SDK
    pub fn submit_failed(key: &str, error: &SubmitError) -> Self {
        let code = match error {
            SubmitError::Serialize(_) => "serialize",
            SubmitError::MethodNotFound { .. } => "method_not_found",
            SubmitError::Expression(_) => "expression",
            SubmitError::Output { .. } => "output",
        };
        Self::CallFailed {
            key: key.to_string(),
            message: error.to_string(),
            code: Some(code.to_string()),
            detail: None,
            timestamp: Self::now(),
        }
    }

    pub fn expression(key: &FormKey, text: &str) -> Self {
        Self::Expression {
            key: key.to_string(),
            text: text.to_string(),
            timestamp: Self::now(),
        }
    }

    pub fn console(line: &str) -> Self {
        Self::Console {
            line: line.to_string(),
            timestamp: Self::now(),
        }
    }

    pub fn form_reset(key: &FormKey) -> Self {
        Self::FormReset {
            key: key.to_string(),
            timestamp: Self::now(),
        }
    }

    pub fn menu_path(key: &str, ancestors: Vec<String>, labels: Vec<String>) -> Self {
        Self::MenuPath {
            key: key.to_string(),
            ancestors,
            labels,
            timestamp: Self::now(),
        }
    }

    pub fn config_initialized(path: &std::path::Path, created: bool) -> Self {
        Self::ConfigInitialized {
            path: path.display().to_string(),
            created,
            timestamp: Self::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            timestamp: Self::now(),
        }
    }
}

/// Output sink that collects emitted expressions as events
#[derive(Debug, Default)]
pub struct EventSink {
    pub events: Vec<HeadlessEvent>,
}

impl OutputSink for EventSink {
    fn write_expression(&mut self, key: &FormKey, text: &str) -> Result<()> {
        self.events.push(HeadlessEvent::expression(key, text));
        Ok(())
    }
}
