//! Outcome normalization for calls into the SDK
//!
//! A target method can fail in three shapes: it can fail while starting
//! (an `Err` return or a panic), it can hand back a deferred result that
//! later rejects or panics, or it can succeed either immediately or
//! later. [`invoke`] folds all of them into one [`Outcome`].
//!
//! There is no retry, timeout or cancellation here. A pending call that
//! never settles keeps `invoke` pending; callers that need a deadline wrap
//! the deferred future themselves before handing it over.

use std::any::Any;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};

use explorer_core::LiveValue;
use futures_util::future::{BoxFuture, FutureExt};
use serde_json::Value;
use thiserror::Error;

/// Result of starting a target call
pub enum Deferred {
    /// The call produced its value synchronously
    Ready(LiveValue),
    /// The call settles later
    Pending(BoxFuture<'static, Result<LiveValue, Thrown>>),
}

impl Deferred {
    pub fn ready(value: impl Into<LiveValue>) -> Self {
        Self::Ready(value.into())
    }

    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<LiveValue, Thrown>> + Send + 'static,
    {
        Self::Pending(future.boxed())
    }
}

impl std::fmt::Debug for Deferred {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// What a target call raised or rejected with
#[derive(Debug, Clone, PartialEq)]
pub enum Thrown {
    /// A proper error object
    Error {
        message: String,
        code: Option<String>,
        detail: Option<Value>,
    },
    /// Any other thrown value
    Value(Value),
}

impl Thrown {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            code: None,
            detail: None,
        }
    }

    pub fn coded(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            code: Some(code.into()),
            detail: None,
        }
    }

    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    /// Attach an upstream detail payload
    pub fn with_detail(self, detail: Value) -> Self {
        match self {
            Self::Error { message, code, .. } => Self::Error {
                message,
                code,
                detail: Some(detail),
            },
            Self::Value(value) => Self::Error {
                message: display_thrown_value(&value),
                code: None,
                detail: Some(detail),
            },
        }
    }
}

/// Normalized failure of a target call
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct InvocationError {
    pub message: String,
    /// Upstream error code, when the SDK provided one
    pub code: Option<String>,
    /// Upstream payload, or the original thrown value
    pub detail: Option<Value>,
}

impl InvocationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            detail: None,
        }
    }

    fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "target panicked with a non-string payload".to_string()
        };
        Self {
            message,
            code: Some("panic".to_string()),
            detail: None,
        }
    }
}

impl From<Thrown> for InvocationError {
    fn from(thrown: Thrown) -> Self {
        match thrown {
            Thrown::Error {
                message,
                code,
                detail,
            } => Self {
                message,
                code,
                detail,
            },
            Thrown::Value(value) => Self {
                message: display_thrown_value(&value),
                code: None,
                detail: Some(value),
            },
        }
    }
}

/// String form of a non-error thrown value
fn display_thrown_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Settled result of one invocation
pub type Outcome = Result<LiveValue, InvocationError>;

/// Run `thunk` and normalize whatever it does into an [`Outcome`]
///
/// A `Ready` value is returned without awaiting anything, so the returned
/// future completes on its first poll.
pub async fn invoke<F>(thunk: F) -> Outcome
where
    F: FnOnce() -> Result<Deferred, Thrown>,
{
    let started = match catch_unwind(AssertUnwindSafe(thunk)) {
        Ok(Ok(deferred)) => deferred,
        Ok(Err(thrown)) => return Err(thrown.into()),
        Err(payload) => return Err(InvocationError::from_panic(payload)),
    };

    match started {
        Deferred::Ready(value) => Ok(value),
        Deferred::Pending(future) => match AssertUnwindSafe(future).catch_unwind().await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(thrown)) => Err(thrown.into()),
            Err(payload) => Err(InvocationError::from_panic(payload)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_sync_throw_becomes_err() {
        let outcome = invoke(|| Err(Thrown::coded("E_AUTH", "not logged in"))).await;
        let err = outcome.unwrap_err();
        assert_eq!(err.message, "not logged in");
        assert_eq!(err.code.as_deref(), Some("E_AUTH"));
    }

    #[tokio::test]
    async fn test_rejected_deferred_becomes_err() {
        let outcome = invoke(|| {
            Ok(Deferred::pending(async {
                tokio::task::yield_now().await;
                Err(Thrown::error("network down").with_detail(json!({"retry": true})))
            }))
        })
        .await;
        let err = outcome.unwrap_err();
        assert_eq!(err.message, "network down");
        assert_eq!(err.detail, Some(json!({"retry": true})));
    }

    #[tokio::test]
    async fn test_plain_value_becomes_ok() {
        let outcome = invoke(|| Ok(Deferred::ready("sent"))).await;
        assert_eq!(outcome.unwrap(), LiveValue::from("sent"));
    }

    #[tokio::test]
    async fn test_resolved_deferred_becomes_ok() {
        let outcome = invoke(|| Ok(Deferred::pending(async { Ok(LiveValue::from(7_i64)) }))).await;
        assert_eq!(outcome.unwrap(), LiveValue::from(7_i64));
    }

    #[test]
    fn test_plain_value_needs_no_scheduling() {
        let ready = invoke(|| Ok(Deferred::ready(true))).now_or_never();
        assert_eq!(ready, Some(Ok(LiveValue::Bool(true))));

        let pending = invoke(|| {
            Ok(Deferred::pending(async {
                futures_util::future::pending::<()>().await;
                Ok(LiveValue::Null)
            }))
        })
        .now_or_never();
        assert!(pending.is_none());
    }

    #[tokio::test]
    async fn test_non_error_values_are_coerced() {
        let err = invoke(|| Err(Thrown::value(404))).await.unwrap_err();
        assert_eq!(err.message, "404");
        assert_eq!(err.detail, Some(json!(404)));

        let err = invoke(|| Err(Thrown::value("plain string"))).await.unwrap_err();
        assert_eq!(err.message, "plain string");
    }

    #[tokio::test]
    async fn test_panics_are_captured() {
        let err = invoke(|| -> Result<Deferred, Thrown> { panic!("sdk exploded") })
            .await
            .unwrap_err();
        assert_eq!(err.message, "sdk exploded");
        assert_eq!(err.code.as_deref(), Some("panic"));

        async fn explode() -> Result<LiveValue, Thrown> {
            panic!("{}", String::from("late failure"))
        }
        let err = invoke(|| Ok(Deferred::pending(explode())))
            .await
            .unwrap_err();
        assert_eq!(err.message, "late failure");
    }
}
