//! Gate configuration.

use serde::Deserialize;
use std::collections::HashSet;

/// How a gate keeps its value current after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateMode {
    /// Read every watched key on each query.
    #[default]
    OnDemand,

    /// Subscribe to change notifications at construction and serve a cached value.
    Observe,
}

/// Configuration for a settings-gated feature.
///
/// ```
/// use settings_gate::{GateConfig, GateMode};
///
/// let config = GateConfig::from_json(
///     r#"{"keys": ["haptic_feedback_enabled", "haptic_on_switch"], "mode": "observe"}"#,
/// ).unwrap();
/// assert_eq!(config.mode, GateMode::Observe);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GateConfig {
    /// Setting keys whose conjunction gates the feature.
    /// An empty list means the feature is always enabled.
    #[serde(default)]
    pub keys: Vec<String>,

    /// Initial refresh mode.
    #[serde(default)]
    pub mode: GateMode,
}

impl GateConfig {
    /// Build a configuration from a key list and mode.
    pub fn new<I, S>(keys: I, mode: GateMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            mode,
        }
    }

    /// Parse a configuration from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, crate::GateError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| crate::GateError::ConfigError(format!("Invalid gate config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), crate::GateError> {
        let mut seen = HashSet::new();
        for key in &self.keys {
            if key.trim().is_empty() {
                return Err(crate::GateError::ConfigError(
                    "setting key cannot be blank".to_string(),
                ));
            }
            if !seen.insert(key.as_str()) {
                return Err(crate::GateError::ConfigError(format!(
                    "duplicate setting key: {}",
                    key
                )));
            }
        }
        Ok(())
    }
}
