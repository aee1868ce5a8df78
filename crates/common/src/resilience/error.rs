//! Error types for the retry executor

use std::time::Duration;

use thiserror::Error;

use crate::error::{ErrorClassification, ErrorSeverity};

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Invalid envelope for domain '{domain}': {field} {reason}")]
    InvalidField { domain: String, field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn field(domain: &str, field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField { domain: domain.to_string(), field, reason: reason.into() }
    }
}

/// Result type for configuration validation
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Terminal errors returned by [`RetryExecutor`](super::RetryExecutor)
///
/// `D` is the caller's domain error, produced by its
/// [`RetryHooks`](super::RetryHooks). The variant records which path ended
/// the call.
#[derive(Debug, Error)]
pub enum RetryError<D>
where
    D: std::error::Error + 'static,
{
    /// The failure policy declined, attempts ran out, or the budget expired
    #[error("Retry exhausted after {attempts} attempt(s): {source}")]
    Exhausted {
        #[source]
        source: D,
        attempts: u32,
    },

    /// The domain's circuit breaker is open
    #[error("Circuit breaker open for domain '{domain}': {source}")]
    CircuitOpen {
        #[source]
        source: D,
        domain: String,
        retry_after: Option<Duration>,
    },

    /// The caller cancelled the call
    #[error("Retry cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32 },

    /// The policy envelope failed validation before any attempt
    #[error(transparent)]
    InvalidEnvelope(#[from] ConfigError),
}

/// Result type for retry executions
pub type RetryResult<T, D> = Result<T, RetryError<D>>;

impl<D> RetryError<D>
where
    D: std::error::Error + 'static,
{
    /// Consume the error and return the caller's domain error, if any
    pub fn into_source(self) -> Option<D> {
        match self {
            Self::Exhausted { source, .. } | Self::CircuitOpen { source, .. } => Some(source),
            Self::Cancelled { .. } | Self::InvalidEnvelope(_) => None,
        }
    }

    /// Borrow the caller's domain error, if any
    pub fn source_error(&self) -> Option<&D> {
        match self {
            Self::Exhausted { source, .. } | Self::CircuitOpen { source, .. } => Some(source),
            Self::Cancelled { .. } | Self::InvalidEnvelope(_) => None,
        }
    }

    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Self::CircuitOpen { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

impl<D> ErrorClassification for RetryError<D>
where
    D: std::error::Error + 'static,
{
    fn is_retryable(&self) -> bool {
        matches!(self, Self::CircuitOpen { .. })
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Exhausted { .. } => ErrorSeverity::Error,
            Self::CircuitOpen { .. } => ErrorSeverity::Warning,
            Self::Cancelled { .. } => ErrorSeverity::Info,
            Self::InvalidEnvelope(_) => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::CircuitOpen { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for resilience::error.
    use super::*;

    #[derive(Debug, Error, PartialEq)]
    #[error("auth failed: {0}")]
    struct AuthFailure(&'static str);

    /// Validates `RetryError::into_source` for each variant.
    ///
    /// Assertions:
    /// - Confirms domain-carrying variants return their source.
    /// - Confirms `Cancelled` returns `None`.
    #[test]
    fn test_into_source() {
        let exhausted: RetryError<AuthFailure> =
            RetryError::Exhausted { source: AuthFailure("401"), attempts: 3 };
        assert_eq!(exhausted.into_source(), Some(AuthFailure("401")));

        let open: RetryError<AuthFailure> = RetryError::CircuitOpen {
            source: AuthFailure("open"),
            domain: "auth".to_string(),
            retry_after: None,
        };
        assert_eq!(open.into_source(), Some(AuthFailure("open")));

        let cancelled: RetryError<AuthFailure> = RetryError::Cancelled { attempts: 1 };
        assert_eq!(cancelled.into_source(), None);
    }

    /// Validates classification of retry errors.
    ///
    /// Assertions:
    /// - Ensures `CircuitOpen` is retryable and carries `retry_after`.
    /// - Ensures `Exhausted` is not retryable.
    /// - Confirms `Cancelled` has `Info` severity.
    #[test]
    fn test_classification() {
        let open: RetryError<AuthFailure> = RetryError::CircuitOpen {
            source: AuthFailure("open"),
            domain: "auth".to_string(),
            retry_after: Some(Duration::from_secs(60)),
        };
        assert!(open.is_retryable());
        assert_eq!(open.retry_after(), Some(Duration::from_secs(60)));
        assert_eq!(open.severity(), ErrorSeverity::Warning);

        let exhausted: RetryError<AuthFailure> =
            RetryError::Exhausted { source: AuthFailure("x"), attempts: 2 };
        assert!(!exhausted.is_retryable());
        assert_eq!(exhausted.severity(), ErrorSeverity::Error);

        let cancelled: RetryError<AuthFailure> = RetryError::Cancelled { attempts: 0 };
        assert_eq!(cancelled.severity(), ErrorSeverity::Info);
        assert!(cancelled.is_cancelled());
    }

    #[test]
    fn test_display_messages() {
        let err: RetryError<AuthFailure> =
            RetryError::Exhausted { source: AuthFailure("token expired"), attempts: 4 };
        assert_eq!(
            err.to_string(),
            "Retry exhausted after 4 attempt(s): auth failed: token expired"
        );

        let cfg = ConfigError::field("auth", "max_attempts", "must be at least 1");
        assert_eq!(
            cfg.to_string(),
            "Invalid envelope for domain 'auth': max_attempts must be at least 1"
        );
    }
}
