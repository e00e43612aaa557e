//! Application error types with rich context

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Infrastructure error types organized by layer
///
/// Serialization and invocation failures have their own typed errors in
/// `explorer-app`; this enum covers everything around them.
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Terminal/TUI Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Terminal error: {message}")]
    Terminal { message: String },

    // ─────────────────────────────────────────────────────────────
    // Schema Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Duplicate parameter '{name}' in schema")]
    DuplicateParameter { name: String },

    #[error("Value for '{name}' does not fit a {kind} parameter")]
    KindMismatch { name: String, kind: String },

    #[error("Unknown parameter '{name}'")]
    UnknownParameter { name: String },

    #[error("Invalid form key: {key}")]
    InvalidFormKey { key: String },

    // ─────────────────────────────────────────────────────────────
    // Persistence Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Store error: {message}")]
    Store { message: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    // ─────────────────────────────────────────────────────────────
    // Catalog Errors
    // ─────────────────────────────────────────────────────────────
    #[error("No page registered for '{key}'")]
    PageNotFound { key: String },

    #[error("Invalid attachment {path}: {message}")]
    Attachment { path: PathBuf, message: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn terminal(message: impl Into<String>) -> Self {
        Self::Terminal {
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn page_not_found(key: impl Into<String>) -> Self {
        Self::PageNotFound { key: key.into() }
    }

    pub fn unknown_parameter(name: impl Into<String>) -> Self {
        Self::UnknownParameter { name: name.into() }
    }

    pub fn attachment(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Attachment {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Errors caused by user input; reported instead of aborting the command
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Store { .. }
                | Error::KindMismatch { .. }
                | Error::UnknownParameter { .. }
                | Error::InvalidFormKey { .. }
                | Error::PageNotFound { .. }
                | Error::Attachment { .. }
        )
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions (for use with color-eyre)
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = Error::store("disk full");
        assert_eq!(err.to_string(), "Store error: disk full");

        let err = Error::DuplicateParameter {
            name: "text".to_string(),
        };
        assert!(err.to_string().contains("'text'"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_error_is_recoverable() {
        assert!(Error::store("test").is_recoverable());
        assert!(Error::page_not_found("im.login").is_recoverable());
        assert!(Error::attachment("/tmp/x", "missing").is_recoverable());
        assert!(Error::InvalidFormKey {
            key: "nodot".to_string()
        }
        .is_recoverable());
        assert!(!Error::config("bad").is_recoverable());
        assert!(!Error::DuplicateParameter {
            name: "a".to_string()
        }
        .is_recoverable());
    }

    #[test]
    fn test_context_preserves_error() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::other("boom"));
        let err = result.context("reading snapshot").unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
