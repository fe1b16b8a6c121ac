//! Key-value settings stores with per-key change observers.
//!
//! Values are stored as strings, the way the platform settings provider
//! keeps them; integer reads parse on the way out.

pub mod file;
pub mod memory;
pub mod observers;

use crate::GateError;
use std::fmt;
use std::sync::Arc;

pub use observers::{ObserverId, ObserverRegistry};

/// Receives change notifications for the keys it was registered against.
///
/// Called synchronously on the writer's thread. Implementations must not
/// block and must not register or unregister observers from inside the call.
pub trait SettingsObserver: Send + Sync {
    /// A watched key changed (or was removed).
    fn on_change(&self, key: &str);
}

/// Synchronous key-value settings store with push notifications.
pub trait SettingsStore: Send + Sync {
    /// Read a raw value. `Ok(None)` means the key is unset.
    fn get_string(&self, key: &str) -> Result<Option<String>, GateError>;

    /// Write a raw value and notify observers of `key`.
    fn put_string(&self, key: &str, value: &str) -> Result<(), GateError>;

    /// Remove a value and notify observers of `key` if it was set.
    fn remove(&self, key: &str) -> Result<(), GateError>;

    /// Register `observer` for changes to any of `keys`.
    fn register_observer(
        &self,
        keys: &[String],
        observer: Arc<dyn SettingsObserver>,
    ) -> ObserverId;

    /// Drop a registration. Unknown ids are ignored.
    fn unregister_observer(&self, id: ObserverId);

    /// Read an integer value, returning `default` when the key is unset or
    /// does not parse as an integer.
    fn get_int(&self, key: &str, default: i64) -> Result<i64, GateError> {
        Ok(self
            .get_string(key)?
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(default))
    }

    /// Write an integer value.
    fn put_int(&self, key: &str, value: i64) -> Result<(), GateError> {
        self.put_string(key, &value.to_string())
    }
}

/// A live observer registration. Unregisters when dropped.
pub struct Subscription {
    store: Arc<dyn SettingsStore>,
    id: ObserverId,
}

impl Subscription {
    /// Register `observer` on `store` for `keys` and wrap the registration.
    pub fn register(
        store: Arc<dyn SettingsStore>,
        keys: &[String],
        observer: Arc<dyn SettingsObserver>,
    ) -> Self {
        let id = store.register_observer(keys, observer);
        tracing::trace!(id = id.get(), keys = ?keys, "settings observer registered");
        Self { store, id }
    }

    /// Registration id.
    pub fn id(&self) -> ObserverId {
        self.id
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.store.unregister_observer(self.id);
        tracing::trace!(id = self.id.get(), "settings observer unregistered");
    }
}
