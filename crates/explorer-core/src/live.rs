//! Live argument values produced for an actual invocation
//!
//! `LiveValue` mirrors the JSON data model and adds the two things a
//! call site can receive that have no JSON form: invocable callbacks and
//! file attachments.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::value::Attachment;

/// Failure raised when a callback is invoked
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallbackError {
    #[error("callback was kept as source text and cannot be invoked: {source_text}")]
    NotCompiled { source_text: String },

    #[error("callback failed: {message}")]
    Runtime { message: String },
}

impl CallbackError {
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }
}

/// A compiled function body, produced by a script engine
pub trait CompiledFunction: Send + Sync {
    fn call(&self, args: &[LiveValue]) -> Result<LiveValue, CallbackError>;
}

impl<F> CompiledFunction for F
where
    F: Fn(&[LiveValue]) -> Result<LiveValue, CallbackError> + Send + Sync,
{
    fn call(&self, args: &[LiveValue]) -> Result<LiveValue, CallbackError> {
        self(args)
    }
}

/// A callback argument
///
/// Always carries its function source text (without any leading `return`
/// token) and optionally a compiled form. Two callbacks are equal when
/// their source text is equal.
#[derive(Clone)]
pub struct Callback {
    source: String,
    compiled: Option<Arc<dyn CompiledFunction>>,
}

impl Callback {
    /// A callback kept as data only
    pub fn source_only(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            compiled: None,
        }
    }

    pub fn compiled(source: impl Into<String>, function: Arc<dyn CompiledFunction>) -> Self {
        Self {
            source: source.into(),
            compiled: Some(function),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.is_some()
    }

    pub fn call(&self, args: &[LiveValue]) -> Result<LiveValue, CallbackError> {
        match &self.compiled {
            Some(function) => function.call(args),
            None => Err(CallbackError::NotCompiled {
                source_text: self.source.clone(),
            }),
        }
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("source", &self.source)
            .field("compiled", &self.is_compiled())
            .finish()
    }
}

/// One argument (or nested member) handed to an SDK method
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LiveValue {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Array(Vec<LiveValue>),
    /// Members in declaration order
    Object(Vec<(String, LiveValue)>),
    Callback(Callback),
    Attachment(Attachment),
}

impl LiveValue {
    /// Look up an object member
    pub fn get(&self, key: &str) -> Option<&LiveValue> {
        match self {
            Self::Object(members) => members.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_callback(&self) -> Option<&Callback> {
        match self {
            Self::Callback(cb) => Some(cb),
            _ => None,
        }
    }

    pub fn as_attachment(&self) -> Option<&Attachment> {
        match self {
            Self::Attachment(a) => Some(a),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// JSON view for display and logging
    ///
    /// Callbacks become their source text, attachments become their
    /// handle object.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
            Self::Array(items) => Value::Array(items.iter().map(LiveValue::to_json).collect()),
            Self::Object(members) => {
                let mut map = Map::new();
                for (k, v) in members {
                    map.insert(k.clone(), v.to_json());
                }
                Value::Object(map)
            }
            Self::Callback(cb) => Value::String(cb.source().to_string()),
            Self::Attachment(a) => serde_json::to_value(a).unwrap_or(Value::Null),
        }
    }
}

impl From<Value> for LiveValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(LiveValue::from).collect()),
            Value::Object(map) => Self::Object(
                map.into_iter()
                    .map(|(k, v)| (k, LiveValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for LiveValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for LiveValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for LiveValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<bool> for LiveValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl fmt::Display for LiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}
