//! Observer registration book-keeping shared by the store backends.

use super::SettingsObserver;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Identifier of one observer registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

impl ObserverId {
    /// Raw numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

struct Registration {
    id: ObserverId,
    keys: Vec<String>,
    observer: Arc<dyn SettingsObserver>,
}

/// Registry of observers keyed by the settings they watch.
#[derive(Default)]
pub struct ObserverRegistry {
    next_id: AtomicU64,
    registrations: Mutex<Vec<Registration>>,
}

impl ObserverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a registration.
    pub fn register(&self, keys: &[String], observer: Arc<dyn SettingsObserver>) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Registration {
                id,
                keys: keys.to_vec(),
                observer,
            });
        id
    }

    /// Remove a registration. Returns whether it existed.
    pub fn unregister(&self, id: ObserverId) -> bool {
        let mut registrations = self
            .registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = registrations.len();
        registrations.retain(|r| r.id != id);
        registrations.len() != before
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether there are no live registrations.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Notify every observer watching `key`.
    ///
    /// The matching observers are collected first and called after the lock
    /// is released, so an observer may read the store it watches.
    pub fn notify(&self, key: &str) {
        let targets: Vec<Arc<dyn SettingsObserver>> = self
            .registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.keys.iter().any(|k| k == key))
            .map(|r| r.observer.clone())
            .collect();

        tracing::trace!(key = %key, observers = targets.len(), "dispatching setting change");
        for observer in targets {
            observer.on_change(key);
        }
    }
}
