//! Thread-safe key/value registry.
//!
//! [`Registry`] is a small concurrent map used as the detached snapshot returned
//! by [`Container::extract`](crate::container::Container::extract). Every
//! operation takes the shard lock only for its own duration, so values are
//! cloned out rather than borrowed.
//!
//! ```rust
//! use weave::registry::Registry;
//!
//! let registry: Registry<String, u32> = Registry::new();
//! registry.set("answer".to_string(), 42);
//! assert_eq!(registry.get("answer"), Some(42));
//! assert_eq!(registry.len(), 1);
//! ```

use dashmap::DashMap;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use crate::container::{Service, ServiceRef};
use crate::core::WeaveError;

/// Concurrent map from keys to cloneable values.
#[derive(Debug)]
pub struct Registry<K, V>
where
    K: Eq + Hash,
{
    data: DashMap<K, V>,
}

impl<K, V> Registry<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
        }
    }

    /// Insert or replace the value stored under `key`.
    pub fn set(&self, key: K, value: V) {
        self.data.insert(key, value);
    }

    /// Clone out the value stored under `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.data.get(key).map(|entry| entry.value().clone())
    }

    /// Remove `key`, returning its value if it was present.
    pub fn delete<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.data.remove(key).map(|(_, value)| value)
    }

    /// Visit every entry until `f` returns `false`.
    ///
    /// Iteration order is unspecified. `f` must not write to this registry.
    pub fn range<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        for entry in &self.data {
            if !f(entry.key(), entry.value()) {
                break;
            }
        }
    }

    /// All keys, in unspecified order.
    pub fn keys(&self) -> Vec<K> {
        self.data.iter().map(|entry| entry.key().clone()).collect()
    }

    /// All values, in unspecified order.
    pub fn values(&self) -> Vec<V> {
        self.data.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Whether `key` is present.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.data.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the registry has no entries.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.data.clear();
    }

    /// Copy the contents into a plain `HashMap`.
    pub fn to_map(&self) -> HashMap<K, V> {
        self.data.iter().map(|entry| (entry.key().clone(), entry.value().clone())).collect()
    }
}

impl<K, V> Default for Registry<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of built services, keyed by service name.
pub type ServiceRegistry = Registry<String, ServiceRef>;

impl Registry<String, ServiceRef> {
    /// Typed lookup that panics when `name` is absent or has a different type.
    ///
    /// # Panics
    ///
    /// Panics with the [`WeaveError`] message on `NotFound` or `TypeMismatch`.
    #[track_caller]
    pub fn must_get<R: Send + Sync + 'static>(&self, name: &str) -> Service<R> {
        match self.lookup(name) {
            Ok(service) => service,
            Err(err) => panic!("{err}"),
        }
    }

    /// Typed lookup that reports absence or a type mismatch as `None`.
    pub fn try_get<R: Send + Sync + 'static>(&self, name: &str) -> Option<Service<R>> {
        self.lookup(name).ok()
    }

    fn lookup<R: Send + Sync + 'static>(&self, name: &str) -> Result<Service<R>, WeaveError> {
        self.get(name).ok_or_else(|| WeaveError::not_found(name))?.downcast::<R>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_delete() {
        let registry: Registry<String, i32> = Registry::new();
        assert!(registry.is_empty());

        registry.set("a".to_string(), 1);
        registry.set("b".to_string(), 2);
        registry.set("a".to_string(), 3);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("a"), Some(3));
        assert!(registry.contains("b"));

        assert_eq!(registry.delete("b"), Some(2));
        assert!(!registry.contains("b"));
        assert_eq!(registry.delete("b"), None);
    }

    #[test]
    fn test_keys_values_and_clear() {
        let registry: Registry<String, i32> = Registry::new();
        registry.set("x".to_string(), 10);
        registry.set("y".to_string(), 20);

        let mut keys = registry.keys();
        keys.sort();
        assert_eq!(keys, vec!["x".to_string(), "y".to_string()]);

        let mut values = registry.values();
        values.sort_unstable();
        assert_eq!(values, vec![10, 20]);

        let map = registry.to_map();
        assert_eq!(map.get("x"), Some(&10));

        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_range_stops_early() {
        let registry: Registry<String, i32> = Registry::new();
        for i in 0..10 {
            registry.set(format!("k{i}"), i);
        }

        let mut visited = 0;
        registry.range(|_, _| {
            visited += 1;
            visited < 3
        });
        assert_eq!(visited, 3);
    }

    #[test]
    fn test_concurrent_writers() {
        let registry: std::sync::Arc<Registry<String, usize>> = std::sync::Arc::new(Registry::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        registry.set(format!("{t}-{i}"), i);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 200);
    }
}
