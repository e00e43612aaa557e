//! Parameter schemas declared by method pages

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::value::{FormValue, FormValueMap};

/// Kind of a declared parameter; selects both the control and the
/// serialization rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    Text,
    Number,
    Boolean,
    Binary,
    Structured,
    CallbackLiteral,
}

impl ParameterKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Binary => "binary",
            Self::Structured => "structured",
            Self::CallbackLiteral => "callback",
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A single declared parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    /// Unique within its schema; also the snapshot key
    pub name: String,
    pub kind: ParameterKind,
    /// Declared default, `None` means the kind's empty value
    pub default: Option<FormValue>,
    /// Display label, falls back to `name`
    pub label: Option<String>,
    /// Help text
    pub description: Option<String>,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            label: None,
            description: None,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::Text)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::Boolean)
    }

    pub fn binary(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::Binary)
    }

    pub fn structured(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::Structured)
    }

    pub fn callback(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::CallbackLiteral)
    }

    pub fn default(mut self, value: impl Into<FormValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// The value a freshly mounted control starts with
    pub fn default_value(&self) -> FormValue {
        self.default
            .clone()
            .unwrap_or_else(|| FormValue::empty_for(self.kind))
    }
}

/// Ordered parameter list for one method
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSchema {
    params: Vec<ParameterDescriptor>,
}

impl ParameterSchema {
    /// Build a schema, rejecting duplicate names and defaults that the
    /// descriptor's control could not hold
    pub fn new(params: Vec<ParameterDescriptor>) -> Result<Self> {
        let mut seen = HashSet::new();
        for param in &params {
            if !seen.insert(param.name.as_str()) {
                return Err(Error::DuplicateParameter {
                    name: param.name.clone(),
                });
            }
            if let Some(default) = &param.default {
                if !default.fits(param.kind) {
                    return Err(Error::KindMismatch {
                        name: param.name.clone(),
                        kind: param.kind.to_string(),
                    });
                }
            }
        }
        Ok(Self { params })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.params.iter()
    }

    pub fn get(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Declared defaults for every parameter
    pub fn defaults(&self) -> FormValueMap {
        self.params
            .iter()
            .map(|p| (p.name.clone(), p.default_value()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a ParameterSchema {
    type Item = &'a ParameterDescriptor;
    type IntoIter = std::slice::Iter<'a, ParameterDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}

/// Stable identifier of a method form: `<namespace>.<method>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FormKey {
    pub namespace: String,
    pub method: String,
}

impl FormKey {
    pub fn new(namespace: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            method: method.into(),
        }
    }

    /// Parse `namespace.method`, splitting on the first dot
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().split_once('.') {
            Some((ns, method)) if !ns.is_empty() && !method.is_empty() => {
                Ok(Self::new(ns, method))
            }
            _ => Err(Error::InvalidFormKey {
                key: raw.to_string(),
            }),
        }
    }

    /// Key used in the persistent store
    pub fn storage_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FormKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_rejects_duplicate_names() {
        let result = ParameterSchema::new(vec![
            ParameterDescriptor::text("to"),
            ParameterDescriptor::number("to"),
        ]);
        assert!(matches!(result, Err(Error::DuplicateParameter { name }) if name == "to"));
    }

    #[test]
    fn test_schema_rejects_default_of_wrong_kind() {
        let result = ParameterSchema::new(vec![ParameterDescriptor::boolean("silent").default(3)]);
        assert!(matches!(result, Err(Error::KindMismatch { .. })));
    }

    #[test]
    fn test_schema_defaults_use_kind_empty_values() {
        let schema = ParameterSchema::new(vec![
            ParameterDescriptor::number("a").default(1),
            ParameterDescriptor::number("b"),
            ParameterDescriptor::structured("ext").default("{}"),
        ])
        .unwrap();

        let defaults = schema.defaults();
        assert_eq!(defaults["a"], FormValue::number(1));
        assert_eq!(defaults["b"], FormValue::number(0));
        assert_eq!(defaults["ext"], FormValue::text("{}"));
    }

    #[test]
    fn test_schema_preserves_declaration_order() {
        let schema = ParameterSchema::new(vec![
            ParameterDescriptor::text("z"),
            ParameterDescriptor::text("a"),
        ])
        .unwrap();
        let names: Vec<_> = schema.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["z", "a"]);
        assert_eq!(schema.get("a").map(|p| p.name.as_str()), Some("a"));
    }

    #[test]
    fn test_display_label_falls_back_to_name() {
        let plain = ParameterDescriptor::text("groupId");
        let labelled = ParameterDescriptor::text("groupId").label("Group ID");
        assert_eq!(plain.display_label(), "groupId");
        assert_eq!(labelled.display_label(), "Group ID");
    }

    #[test]
    fn test_form_key_parse() {
        let key = FormKey::parse("im.sendText").unwrap();
        assert_eq!(key.namespace, "im");
        assert_eq!(key.method, "sendText");
        assert_eq!(key.storage_key(), "im.sendText");

        assert!(FormKey::parse("sendText").is_err());
        assert!(FormKey::parse(".sendText").is_err());
        assert!(FormKey::parse("im.").is_err());
    }
}
