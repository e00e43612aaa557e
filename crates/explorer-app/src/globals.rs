//! Identifier → stored return value registry
//!
//! Pages that declare `store_result_as` put successful results here; the
//! serializer resolves `[[identifier]]` references against it.

use std::collections::BTreeMap;

use explorer_core::LiveValue;

#[derive(Debug, Clone, Default)]
pub struct GlobalRegistry {
    values: BTreeMap<String, LiveValue>,
}

impl GlobalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `identifier`, returning the previous value if any
    pub fn insert(&mut self, identifier: impl Into<String>, value: LiveValue) -> Option<LiveValue> {
        let identifier = identifier.into();
        tracing::debug!("Storing global '{}'", identifier);
        self.values.insert(identifier, value)
    }

    pub fn get(&self, identifier: &str) -> Option<&LiveValue> {
        self.values.get(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.values.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, LiveValue)> for GlobalRegistry {
    fn from_iter<I: IntoIterator<Item = (K, LiveValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_replaces_and_returns_previous() {
        let mut globals = GlobalRegistry::new();
        assert!(globals.insert("conv", LiveValue::from(1_i64)).is_none());
        let previous = globals.insert("conv", LiveValue::from(json!({"id": "c2"})));

        assert_eq!(previous, Some(LiveValue::from(1_i64)));
        assert_eq!(globals.len(), 1);
        assert_eq!(
            globals.get("conv").and_then(|v| v.get("id")).and_then(LiveValue::as_str),
            Some("c2")
        );
    }

    #[test]
    fn test_collect_binds_every_pair() {
        let globals: GlobalRegistry = [
            ("zeta", LiveValue::Null),
            ("alpha", LiveValue::Bool(true)),
        ]
        .into_iter()
        .collect();
        assert_eq!(globals.len(), 2);
        assert!(globals.contains("zeta"));
        assert_eq!(globals.get("alpha"), Some(&LiveValue::Bool(true)));
        assert!(!globals.contains("beta"));
    }
}
