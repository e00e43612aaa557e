//! Explicit `(namespace, method)` → callable registry

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use explorer_core::{FormKey, LiveValue};

use crate::invocation::{Deferred, Thrown};

/// A callable SDK method
///
/// Implementations either return synchronously (`Deferred::Ready`), hand back
/// a future (`Deferred::Pending`), or fail outright with `Err`. Panics are
/// caught by [`crate::invocation::invoke`].
pub trait SdkMethod: Send + Sync {
    fn call(&self, args: Vec<LiveValue>) -> Result<Deferred, Thrown>;
}

impl<F> SdkMethod for F
where
    F: Fn(Vec<LiveValue>) -> Result<Deferred, Thrown> + Send + Sync,
{
    fn call(&self, args: Vec<LiveValue>) -> Result<Deferred, Thrown> {
        self(args)
    }
}

#[derive(Clone, Default)]
pub struct SdkRegistry {
    methods: BTreeMap<FormKey, Arc<dyn SdkMethod>>,
}

impl SdkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `namespace.method`, replacing any previous entry
    pub fn register<M>(&mut self, namespace: &str, method: &str, callable: M) -> &mut Self
    where
        M: SdkMethod + 'static,
    {
        let key = FormKey::new(namespace, method);
        if self.methods.insert(key.clone(), Arc::new(callable)).is_some() {
            tracing::warn!("Replacing registered SDK method {}", key);
        }
        self
    }

    pub fn get(&self, key: &FormKey) -> Option<Arc<dyn SdkMethod>> {
        self.methods.get(key).cloned()
    }

    pub fn contains(&self, key: &FormKey) -> bool {
        self.methods.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &FormKey> {
        self.methods.keys()
    }

    /// Distinct namespaces in sorted order
    pub fn namespaces(&self) -> Vec<&str> {
        let mut namespaces: Vec<&str> = self.methods.keys().map(|k| k.namespace.as_str()).collect();
        namespaces.dedup();
        namespaces
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl fmt::Debug for SdkRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.methods.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo(args: Vec<LiveValue>) -> Result<Deferred, Thrown> {
        Ok(Deferred::ready(LiveValue::Array(args)))
    }

    #[test]
    fn test_register_and_call() {
        let mut registry = SdkRegistry::new();
        registry
            .register("im", "echo", echo)
            .register("im", "fail", |_args: Vec<LiveValue>| -> Result<Deferred, Thrown> {
                Err(Thrown::error("nope"))
            });

        let method = registry.get(&FormKey::new("im", "echo")).unwrap();
        match method.call(vec![LiveValue::from(1_i64)]).unwrap() {
            Deferred::Ready(value) => {
                assert_eq!(value, LiveValue::Array(vec![LiveValue::from(1_i64)]))
            }
            Deferred::Pending(_) => panic!("expected a ready value"),
        }
        assert!(registry
            .get(&FormKey::new("im", "fail"))
            .unwrap()
            .call(vec![])
            .is_err());
        assert!(registry.get(&FormKey::new("group", "echo")).is_none());
    }

    #[test]
    fn test_namespaces_are_distinct_and_sorted() {
        let mut registry = SdkRegistry::new();
        registry
            .register("im", "b", echo)
            .register("group", "a", echo)
            .register("im", "a", echo);

        assert_eq!(registry.namespaces(), vec!["group", "im"]);
        assert_eq!(registry.len(), 3);
        assert!(registry.contains(&FormKey::new("im", "a")));
    }

    #[test]
    fn test_registered_pending_method_through_invoke() {
        let mut registry = SdkRegistry::new();
        registry.register(
            "im",
            "later",
            |args: Vec<LiveValue>| -> Result<Deferred, Thrown> {
                Ok(Deferred::pending(async move {
                    Ok(LiveValue::from(args.len() as i64))
                }))
            },
        );
        let method = registry.get(&FormKey::new("im", "later")).unwrap();

        let outcome = tokio_test::block_on(crate::invocation::invoke(move || {
            method.call(vec![LiveValue::Null, LiveValue::Null])
        }));
        assert_eq!(outcome, Ok(LiveValue::from(2_i64)));
    }
}
