//! Settings gate error types.

use thiserror::Error;

/// Errors raised by the fallible surfaces of the crate.
///
/// The gate decision path never returns one of these: read failures there
/// are mapped to "enabled".
#[derive(Debug, Error)]
pub enum GateError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Settings store I/O failed.
    #[error("Settings store I/O error: {0}")]
    StoreIO(String),

    /// Settings store contents could not be parsed.
    #[error("Settings store parse error: {0}")]
    StoreParse(String),

    /// Background executor could not be created.
    #[error("Executor error: {0}")]
    Executor(String),

    /// Haptic output failed.
    #[error("Haptic output error: {0}")]
    Haptic(String),
}
