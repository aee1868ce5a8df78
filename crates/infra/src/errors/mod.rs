//! Infrastructure error type
//!
//! Failures from the file system, environment, and metric registries are
//! surfaced as [`InfraError`]. Shared patterns (serialization, I/O) route
//! through [`CommonError`] so they classify the same way across crates.

mod conversions;

use voxguard_common::resilience::ConfigError;
use voxguard_common::CommonError;

/// Result type for infrastructure operations
pub type InfraResult<T> = Result<T, InfraError>;

/// Errors raised by configuration loading and metrics plumbing
#[derive(Debug, thiserror::Error)]
pub enum InfraError {
    /// Configuration could not be located, read, or interpreted
    #[error("Configuration error: {0}")]
    Config(String),

    /// A loaded envelope failed validation
    #[error(transparent)]
    Envelope(#[from] ConfigError),

    /// Metric registration or encoding failed
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error(transparent)]
    Common(#[from] CommonError),
}

impl InfraError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
