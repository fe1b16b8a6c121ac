//! # settings-gate
//!
//! **Feature gates driven by system settings.**
//!
//! A [`SettingGatedFeature`] decides whether a side effect (a vibration, an
//! indicator, anything fire-and-forget) should run by AND-ing a fixed list of
//! integer settings. It either reads the settings on every query or keeps a
//! cached value warm through a change subscription on the [`SettingsStore`].
//!
//! ## Features
//!
//! - **Conjunction gates**: every watched setting must be on
//! - **Fail-open reads**: unset or unreadable settings count as on
//! - **Scoped subscriptions**: observers are released on unsubscribe or drop
//! - **Off-thread effects**: gated actions run on a background executor
//! - **Consumers**: settings-aware haptic feedback and a carrier label model
//!
//! ## Quickstart
//!
//! ```
//! use settings_gate::{
//!     BackgroundExecutor, GateMode, MemoryStore, SettingGatedFeature, SettingsStore,
//! };
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), settings_gate::GateError> {
//!     let store = Arc::new(MemoryStore::new());
//!     let executor = Arc::new(BackgroundExecutor::shared()?);
//!
//!     let mut gate = SettingGatedFeature::new(
//!         store.clone(),
//!         executor,
//!         ["haptic_feedback_enabled"],
//!         GateMode::Observe,
//!     );
//!     assert!(gate.evaluate());
//!
//!     store.put_int("haptic_feedback_enabled", 0)?;
//!     assert!(!gate.evaluate());
//!
//!     gate.unsubscribe();
//!     Ok(())
//! }
//! ```
//!
//! ## Fail-open
//!
//! A gate whose store cannot be read stays open. This keeps feedback working
//! on fresh installs where the settings were never written. Do not gate
//! anything that must stay off on failure.

#![deny(warnings)]
#![deny(missing_docs)]

// Core modules
pub mod config;
pub mod errors;
pub mod keys;

// Settings stores
pub mod store;

// Execution
pub mod executor;

// Gate (main public API)
pub mod gate;

// Consumers
pub mod carrier;
pub mod haptics;

// Re-exports for public API
pub use carrier::{CarrierLabel, OperatorSource, ProviderUpdate};
pub use config::{GateConfig, GateMode};
pub use errors::GateError;
pub use executor::{Action, ActionExecutor, BackgroundExecutor};
pub use gate::SettingGatedFeature;
pub use haptics::{EffectId, HapticFeedback, VibrationEffect, Vibrator};
pub use store::file::FileStore;
pub use store::memory::MemoryStore;
pub use store::{ObserverId, SettingsObserver, SettingsStore, Subscription};

#[cfg(any(test, feature = "test-seams"))]
pub use executor::InlineExecutor;
