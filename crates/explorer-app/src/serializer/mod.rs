//! Schema + raw values → call arguments
//!
//! [`serialize`] runs in one of two modes:
//! - **Execute** produces [`LiveValue`] arguments a registered method can
//!   be called with directly.
//! - **Output** produces [`Literal`]s that are assembled into a
//!   copy-pasteable `<namespace>.<method>(...)` expression.
//!
//! The two modes agree: parsing the Output text back with
//! [`call_expr::parse_call_expression`] and evaluating it yields the same
//! arguments as Execute mode (Binary parameters excepted, they have no
//! textual form).

pub mod call_expr;
pub mod special;

use std::fmt;

use explorer_core::{
    FormValue, FormValueMap, LiveValue, ParameterDescriptor, ParameterKind, ParameterSchema,
};
use serde_json::{Number, Value};
use thiserror::Error;

use crate::globals::GlobalRegistry;
use crate::script::ScriptEngine;

pub use special::{callback_source, global_reference, CALLBACK_TOKEN};

/// Default accessor that prefixes emitted global references
pub const DEFAULT_GLOBAL_ACCESSOR: &str = "window";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationMode {
    Execute,
    Output,
}

/// Serialization failure; always names the parameter (or reference) at fault
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializeError {
    #[error("Parameter '{param}' is not valid structured data: {reason}")]
    StructuredParseError { param: String, reason: String },

    #[error("Parameter '{param}' needs an attachment")]
    MissingAttachment { param: String },

    #[error("Reference [[{identifier}]] is not bound")]
    UnresolvedReference { identifier: String },

    #[error("Parameter '{param}' is binary and has no textual form")]
    UnsupportedOutputForBinary { param: String },

    #[error("Parameter '{param}': '{raw}' is not a number")]
    InvalidNumber { param: String, raw: String },

    #[error("Parameter '{param}': '{raw}' is not a boolean")]
    InvalidBoolean { param: String, raw: String },

    #[error("Parameter '{param}': callback does not compile: {reason}")]
    CallbackCompile { param: String, reason: String },
}

impl SerializeError {
    /// The failing parameter; references report their identifier instead
    pub fn param(&self) -> &str {
        match self {
            Self::StructuredParseError { param, .. }
            | Self::MissingAttachment { param }
            | Self::UnsupportedOutputForBinary { param }
            | Self::InvalidNumber { param, .. }
            | Self::InvalidBoolean { param, .. }
            | Self::CallbackCompile { param, .. } => param,
            Self::UnresolvedReference { identifier } => identifier,
        }
    }
}

/// Collaborators a serialization pass reads from
#[derive(Clone, Copy)]
pub struct SerializeContext<'a> {
    pub globals: &'a GlobalRegistry,
    pub engine: &'a dyn ScriptEngine,
    /// Object through which emitted references reach a global (`window`)
    pub global_accessor: &'a str,
}

impl<'a> SerializeContext<'a> {
    pub fn new(globals: &'a GlobalRegistry, engine: &'a dyn ScriptEngine) -> Self {
        Self {
            globals,
            engine,
            global_accessor: DEFAULT_GLOBAL_ACCESSOR,
        }
    }

    pub fn with_accessor(mut self, accessor: &'a str) -> Self {
        self.global_accessor = accessor;
        self
    }

    fn resolve(&self, identifier: &str) -> Result<LiveValue, SerializeError> {
        self.globals
            .get(identifier)
            .cloned()
            .ok_or_else(|| SerializeError::UnresolvedReference {
                identifier: identifier.to_string(),
            })
    }

    fn compile(&self, param: &str, source: &str) -> Result<LiveValue, SerializeError> {
        self.engine
            .compile(source)
            .map(LiveValue::Callback)
            .map_err(|e| SerializeError::CallbackCompile {
                param: param.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Output-mode form of one argument
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Written as JSON
    Json(Value),
    /// Written verbatim: accessor references and function text
    Raw(String),
    Array(Vec<Literal>),
    /// Members in declaration order
    Object(Vec<(String, Literal)>),
}

impl Literal {
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut String) {
        match self {
            Self::Json(value) => out.push_str(&value.to_string()),
            Self::Raw(text) => out.push_str(text),
            Self::Array(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write_to(out);
                }
                out.push(']');
            }
            Self::Object(members) => {
                out.push('{');
                for (i, (key, value)) in members.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(&Value::String(key.clone()).to_string());
                    out.push(':');
                    value.write_to(out);
                }
                out.push('}');
            }
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Result of one serialization pass
#[derive(Debug, Clone, PartialEq)]
pub enum SerializedArgs {
    Execute(Vec<LiveValue>),
    Output(Vec<Literal>),
}

impl SerializedArgs {
    pub fn mode(&self) -> SerializationMode {
        match self {
            Self::Execute(_) => SerializationMode::Execute,
            Self::Output(_) => SerializationMode::Output,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Execute(args) => args.len(),
            Self::Output(args) => args.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_live(self) -> Option<Vec<LiveValue>> {
        match self {
            Self::Execute(args) => Some(args),
            Self::Output(_) => None,
        }
    }

    pub fn into_literals(self) -> Option<Vec<Literal>> {
        match self {
            Self::Output(args) => Some(args),
            Self::Execute(_) => None,
        }
    }
}

/// Serialize every parameter of `schema` in declaration order
///
/// Values missing from `values` fall back to the descriptor default. The
/// first failing parameter aborts the pass.
pub fn serialize(
    schema: &ParameterSchema,
    values: &FormValueMap,
    mode: SerializationMode,
    ctx: &SerializeContext<'_>,
) -> Result<SerializedArgs, SerializeError> {
    match mode {
        SerializationMode::Execute => execute_args(schema, values, ctx).map(SerializedArgs::Execute),
        SerializationMode::Output => output_args(schema, values, ctx).map(SerializedArgs::Output),
    }
}

pub fn execute_args(
    schema: &ParameterSchema,
    values: &FormValueMap,
    ctx: &SerializeContext<'_>,
) -> Result<Vec<LiveValue>, SerializeError> {
    schema
        .iter()
        .map(|descriptor| {
            let value = value_for(descriptor, values);
            execute_one(descriptor, &value, ctx)
        })
        .collect()
}

pub fn output_args(
    schema: &ParameterSchema,
    values: &FormValueMap,
    ctx: &SerializeContext<'_>,
) -> Result<Vec<Literal>, SerializeError> {
    schema
        .iter()
        .map(|descriptor| {
            let value = value_for(descriptor, values);
            output_one(descriptor, &value, ctx)
        })
        .collect()
}

fn value_for(descriptor: &ParameterDescriptor, values: &FormValueMap) -> FormValue {
    values
        .get(&descriptor.name)
        .cloned()
        .unwrap_or_else(|| descriptor.default_value())
}

fn execute_one(
    descriptor: &ParameterDescriptor,
    value: &FormValue,
    ctx: &SerializeContext<'_>,
) -> Result<LiveValue, SerializeError> {
    let param = descriptor.name.as_str();
    match descriptor.kind {
        ParameterKind::Text => Ok(LiveValue::String(value.display())),
        ParameterKind::Number => coerce_number(param, value).map(LiveValue::Number),
        ParameterKind::Boolean => coerce_bool(param, value).map(LiveValue::Bool),
        ParameterKind::Binary => match value {
            FormValue::Attachments(items) if !items.is_empty() => {
                Ok(LiveValue::Attachment(items[0].clone()))
            }
            _ => Err(SerializeError::MissingAttachment {
                param: param.to_string(),
            }),
        },
        ParameterKind::Structured => {
            let raw = value.display();
            if let Some(identifier) = global_reference(&raw) {
                return ctx.resolve(identifier);
            }
            let parsed = parse_structured(param, &raw)?;
            execute_structured(param, parsed, ctx)
        }
        ParameterKind::CallbackLiteral => {
            let raw = value.display();
            match callback_source(&raw) {
                Some(source) => ctx.compile(param, source),
                None => Ok(LiveValue::String(raw)),
            }
        }
    }
}

fn output_one(
    descriptor: &ParameterDescriptor,
    value: &FormValue,
    ctx: &SerializeContext<'_>,
) -> Result<Literal, SerializeError> {
    let param = descriptor.name.as_str();
    match descriptor.kind {
        ParameterKind::Text => Ok(Literal::Json(Value::String(value.display()))),
        ParameterKind::Number => coerce_number(param, value).map(|n| Literal::Json(Value::Number(n))),
        ParameterKind::Boolean => coerce_bool(param, value).map(|b| Literal::Json(Value::Bool(b))),
        ParameterKind::Binary => Err(SerializeError::UnsupportedOutputForBinary {
            param: param.to_string(),
        }),
        ParameterKind::Structured => {
            let raw = value.display();
            if let Some(identifier) = global_reference(&raw) {
                return Ok(Literal::Raw(format!("{}.{}", ctx.global_accessor, identifier)));
            }
            let parsed = parse_structured(param, &raw)?;
            Ok(output_structured(parsed))
        }
        ParameterKind::CallbackLiteral => {
            let raw = value.display();
            Ok(match callback_source(&raw) {
                Some(source) => Literal::Raw(source.to_string()),
                None => Literal::Json(Value::String(raw)),
            })
        }
    }
}

fn parse_structured(param: &str, raw: &str) -> Result<Value, SerializeError> {
    serde_json::from_str(raw).map_err(|e| SerializeError::StructuredParseError {
        param: param.to_string(),
        reason: e.to_string(),
    })
}

/// Compile top-level callback strings; anything nested deeper stays data
fn execute_structured(
    param: &str,
    value: Value,
    ctx: &SerializeContext<'_>,
) -> Result<LiveValue, SerializeError> {
    let leaf = |v: Value| -> Result<LiveValue, SerializeError> {
        match v {
            Value::String(s) => match callback_source(&s) {
                Some(source) => ctx.compile(param, source),
                None => Ok(LiveValue::String(s)),
            },
            other => Ok(LiveValue::from(other)),
        }
    };

    match value {
        Value::Object(map) => Ok(LiveValue::Object(
            map.into_iter()
                .map(|(k, v)| leaf(v).map(|v| (k, v)))
                .collect::<Result<_, _>>()?,
        )),
        Value::Array(items) => Ok(LiveValue::Array(
            items.into_iter().map(leaf).collect::<Result<_, _>>()?,
        )),
        other => leaf(other),
    }
}

fn output_structured(value: Value) -> Literal {
    fn leaf(v: Value) -> Literal {
        match v {
            Value::String(s) => match callback_source(&s) {
                Some(source) => Literal::Raw(source.to_string()),
                None => Literal::Json(Value::String(s)),
            },
            other => Literal::Json(other),
        }
    }

    match value {
        Value::Object(map) => Literal::Object(map.into_iter().map(|(k, v)| (k, leaf(v))).collect()),
        Value::Array(items) => Literal::Array(items.into_iter().map(leaf).collect()),
        other => leaf(other),
    }
}

fn coerce_number(param: &str, value: &FormValue) -> Result<Number, SerializeError> {
    let invalid = |raw: &str| SerializeError::InvalidNumber {
        param: param.to_string(),
        raw: raw.to_string(),
    };
    match value {
        FormValue::Number(n) => Ok(n.clone()),
        FormValue::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(Number::from(0));
            }
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(Number::from(i));
            }
            if let Ok(u) = trimmed.parse::<u64>() {
                return Ok(Number::from(u));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .ok_or_else(|| invalid(text))
        }
        other => Err(invalid(&other.display())),
    }
}

fn coerce_bool(param: &str, value: &FormValue) -> Result<bool, SerializeError> {
    match value {
        FormValue::Bool(b) => Ok(*b),
        FormValue::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" | "" => Ok(false),
            _ => Err(SerializeError::InvalidBoolean {
                param: param.to_string(),
                raw: text.clone(),
            }),
        },
        FormValue::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
        other => Err(SerializeError::InvalidBoolean {
            param: param.to_string(),
            raw: other.display(),
        }),
    }
}
