//! In-memory settings store.

use super::{ObserverId, ObserverRegistry, SettingsObserver, SettingsStore};
use crate::GateError;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Settings store backed by a `HashMap`.
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
    observers: ObserverRegistry,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with integer values. No observers fire.
    pub fn with_ints<'a>(values: impl IntoIterator<Item = (&'a str, i64)>) -> Self {
        let store = Self::new();
        {
            let mut map = store.values.write().unwrap_or_else(PoisonError::into_inner);
            for (key, value) in values {
                map.insert(key.to_string(), value.to_string());
            }
        }
        store
    }

    /// Number of live observer registrations.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

impl SettingsStore for MemoryStore {
    fn get_string(&self, key: &str) -> Result<Option<String>, GateError> {
        Ok(self
            .values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn put_string(&self, key: &str, value: &str) -> Result<(), GateError> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        self.observers.notify(key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), GateError> {
        let removed = self
            .values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some();
        if removed {
            self.observers.notify(key);
        }
        Ok(())
    }

    fn register_observer(
        &self,
        keys: &[String],
        observer: Arc<dyn SettingsObserver>,
    ) -> ObserverId {
        self.observers.register(keys, observer)
    }

    fn unregister_observer(&self, id: ObserverId) {
        self.observers.unregister(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ReadBack {
        store: Arc<MemoryStore>,
        seen: AtomicUsize,
    }

    impl SettingsObserver for ReadBack {
        fn on_change(&self, key: &str) {
            // Reading the store from inside the callback must not deadlock.
            let value = self.store.get_int(key, -1).unwrap();
            self.seen.store(value as usize, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_put_get_remove() {
        let store = MemoryStore::new();
        store.put_string("label", "Carrier").unwrap();
        assert_eq!(store.get_string("label").unwrap().as_deref(), Some("Carrier"));

        store.remove("label").unwrap();
        assert!(store.get_string("label").unwrap().is_none());
    }

    #[test]
    fn test_with_ints() {
        let store = MemoryStore::with_ints([("a", 1), ("b", 0)]);
        assert_eq!(store.get_int("a", 0).unwrap(), 1);
        assert_eq!(store.get_int("b", 1).unwrap(), 0);
    }

    #[test]
    fn test_observer_can_read_store() {
        let store = Arc::new(MemoryStore::new());
        let observer = Arc::new(ReadBack {
            store: store.clone(),
            seen: AtomicUsize::new(0),
        });
        store.register_observer(&["x".to_string()], observer.clone());

        store.put_int("x", 42).unwrap();
        assert_eq!(observer.seen.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn test_remove_unset_key_is_silent() {
        let store = Arc::new(MemoryStore::new());
        let observer = Arc::new(ReadBack {
            store: store.clone(),
            seen: AtomicUsize::new(5),
        });
        store.register_observer(&["x".to_string()], observer.clone());

        store.remove("x").unwrap();
        assert_eq!(observer.seen.load(Ordering::SeqCst), 5);
    }
}
