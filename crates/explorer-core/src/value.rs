//! Raw form values as held by controls and persisted in snapshots

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::schema::ParameterKind;

/// Map from parameter name to the control's current raw value
///
/// Sorted by name; argument order always comes from the schema.
pub type FormValueMap = BTreeMap<String, FormValue>;

/// A file picked for a Binary parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// File name shown in the control
    pub name: String,
    /// Location on disk
    pub path: PathBuf,
    /// Size in bytes at pick time
    #[serde(default)]
    pub size: u64,
}

impl Attachment {
    /// Build an attachment handle from a file on disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)
            .map_err(|e| Error::attachment(path, e.to_string()))?;
        if !metadata.is_file() {
            return Err(Error::attachment(path, "not a regular file"));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            path: path.to_path_buf(),
            size: metadata.len(),
        })
    }

    /// Read the attachment contents
    pub fn read(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.path).map_err(|e| Error::attachment(&self.path, e.to_string()))
    }
}

/// The literal input of one control
///
/// Structured and callback parameters hold their raw text in `Text`; it is
/// only parsed at serialization time.
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
    Attachments(Vec<Attachment>),
}

impl FormValue {
    /// The value a control shows when its descriptor declares no default
    pub fn empty_for(kind: ParameterKind) -> Self {
        match kind {
            ParameterKind::Text | ParameterKind::Structured | ParameterKind::CallbackLiteral => {
                Self::Text(String::new())
            }
            ParameterKind::Number => Self::Number(0.into()),
            ParameterKind::Boolean => Self::Bool(false),
            ParameterKind::Binary => Self::Attachments(Vec::new()),
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn number(value: i64) -> Self {
        Self::Number(value.into())
    }

    /// Float number value; non-finite input has no JSON form and yields `None`
    pub fn float(value: f64) -> Option<Self> {
        serde_json::Number::from_f64(value).map(Self::Number)
    }

    /// Whether this value can be held by a control of `kind`
    pub fn fits(&self, kind: ParameterKind) -> bool {
        match kind {
            ParameterKind::Text | ParameterKind::Structured | ParameterKind::CallbackLiteral => {
                matches!(self, Self::Text(_))
            }
            ParameterKind::Number => matches!(self, Self::Number(_) | Self::Text(_)),
            ParameterKind::Boolean => matches!(self, Self::Bool(_) | Self::Text(_)),
            ParameterKind::Binary => matches!(self, Self::Attachments(_)),
        }
    }

    /// Text form used by editors
    pub fn display(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => if *b { "true" } else { "false" }.to_string(),
            Self::Attachments(items) => items
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Snapshot representation
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Number(n) => Value::Number(n.clone()),
            Self::Bool(b) => Value::Bool(*b),
            Self::Attachments(items) => Value::Array(
                items
                    .iter()
                    .filter_map(|a| serde_json::to_value(a).ok())
                    .collect(),
            ),
        }
    }

    /// Read a snapshot entry back for a control of `kind`
    ///
    /// Returns `None` when the stored JSON type cannot be held by that
    /// control, so the caller falls back to the declared default.
    pub fn from_json(kind: ParameterKind, value: &Value) -> Option<Self> {
        match (kind, value) {
            (
                ParameterKind::Text | ParameterKind::Structured | ParameterKind::CallbackLiteral,
                Value::String(s),
            ) => Some(Self::Text(s.clone())),
            (ParameterKind::Number, Value::Number(n)) => Some(Self::Number(n.clone())),
            (ParameterKind::Number, Value::String(s)) => Some(Self::Text(s.clone())),
            (ParameterKind::Boolean, Value::Bool(b)) => Some(Self::Bool(*b)),
            (ParameterKind::Binary, Value::Array(_)) => {
                serde_json::from_value::<Vec<Attachment>>(value.clone())
                    .ok()
                    .map(Self::Attachments)
            }
            _ => None,
        }
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FormValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<i32> for FormValue {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<bool> for FormValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}
