//! JSON file-backed settings store with atomic writes.
//!
//! Stores settings under `dirs::config_dir()/<namespace>/settings.json`.
//! Uses temp file + rename for atomic writes.

use super::{ObserverId, ObserverRegistry, SettingsObserver, SettingsStore};
use crate::GateError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

const SETTINGS_FILE: &str = "settings.json";

/// File-backed settings store.
///
/// The file is read once when the store is opened and again on
/// [`FileStore::reload`]; every write goes straight back to disk.
pub struct FileStore {
    /// Path to the settings file.
    path: PathBuf,
    /// Current settings.
    values: RwLock<BTreeMap<String, String>>,
    observers: ObserverRegistry,
}

impl FileStore {
    /// Open the store for the given namespace.
    ///
    /// Settings are stored under `dirs::config_dir()/<namespace>/`.
    pub fn new(namespace: &str) -> Result<Self, GateError> {
        let base_dir = dirs::config_dir()
            .ok_or_else(|| GateError::StoreIO("Could not find config directory".to_string()))?;
        Self::with_dir(base_dir.join(namespace))
    }

    /// Open the store in a specific directory.
    pub fn with_dir(dir: PathBuf) -> Result<Self, GateError> {
        fs::create_dir_all(&dir)
            .map_err(|e| GateError::StoreIO(format!("Failed to create settings dir: {}", e)))?;

        let path = dir.join(SETTINGS_FILE);
        let values = read_settings(&path)?;
        tracing::debug!(path = %path.display(), count = values.len(), "settings store opened");

        Ok(Self {
            path,
            values: RwLock::new(values),
            observers: ObserverRegistry::new(),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the backing file and notify observers of every key whose
    /// value changed, appeared or disappeared.
    pub fn reload(&self) -> Result<(), GateError> {
        let fresh = read_settings(&self.path)?;
        let changed: Vec<String> = {
            let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
            let mut changed: Vec<String> = fresh
                .iter()
                .filter(|(k, v)| values.get(*k) != Some(*v))
                .map(|(k, _)| k.clone())
                .collect();
            changed.extend(values.keys().filter(|k| !fresh.contains_key(*k)).cloned());
            *values = fresh;
            changed
        };

        tracing::debug!(changed = changed.len(), "settings store reloaded");
        for key in &changed {
            self.observers.notify(key);
        }
        Ok(())
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<(), GateError> {
        let json = serde_json::to_string_pretty(values)
            .map_err(|e| GateError::StoreParse(format!("Failed to serialize settings: {}", e)))?;

        let temp_path = self.path.with_extension("json.tmp");

        // Write to temp file
        fs::write(&temp_path, json)
            .map_err(|e| GateError::StoreIO(format!("Failed to write temp file: {}", e)))?;

        // Atomic rename
        fs::rename(&temp_path, &self.path)
            .map_err(|e| GateError::StoreIO(format!("Failed to rename settings file: {}", e)))?;

        Ok(())
    }
}

/// Load settings from disk. A missing file is an empty store.
///
/// Non-string scalars are accepted and stored in their string form;
/// booleans become `"1"`/`"0"`.
fn read_settings(path: &Path) -> Result<BTreeMap<String, String>, GateError> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }

    let json = fs::read_to_string(path)
        .map_err(|e| GateError::StoreIO(format!("Failed to read settings file: {}", e)))?;
    let raw: BTreeMap<String, Value> = serde_json::from_str(&json)
        .map_err(|e| GateError::StoreParse(format!("Failed to parse settings file: {}", e)))?;

    raw.into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => String::from(if b { "1" } else { "0" }),
                other => {
                    return Err(GateError::StoreParse(format!(
                        "Setting {} has unsupported value {}",
                        key, other
                    )))
                }
            };
            Ok((key, value))
        })
        .collect()
}

impl SettingsStore for FileStore {
    fn get_string(&self, key: &str) -> Result<Option<String>, GateError> {
        Ok(self
            .values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn put_string(&self, key: &str, value: &str) -> Result<(), GateError> {
        {
            let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
            let mut next = values.clone();
            next.insert(key.to_string(), value.to_string());
            self.persist(&next)?;
            *values = next;
        }
        self.observers.notify(key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), GateError> {
        {
            let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
            if !values.contains_key(key) {
                return Ok(());
            }
            let mut next = values.clone();
            next.remove(key);
            self.persist(&next)?;
            *values = next;
        }
        self.observers.notify(key);
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
