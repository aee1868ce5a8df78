//! Error classification shared across voxguard crates
//!
//! - [`ErrorSeverity`] is the scale used in logs and as the `severity`
//!   label on retry attempt metrics.
//! - [`ErrorClassification`] lets callers ask any error whether it is
//!   retryable and how loudly to report it.
//! - [`CommonError`] carries the failures every crate hits when reading
//!   envelopes from disk: I/O and decoding.
//!
//! Crate-level errors wrap `CommonError` in a transparent variant and derive
//! their conversions and classification from it with
//! [`impl_error_conversion!`](crate::impl_error_conversion) and
//! [`impl_error_classification!`](crate::impl_error_classification):
//!
//! ```rust,ignore
//! #[derive(Debug, thiserror::Error)]
//! pub enum LoaderError {
//!     #[error("Unknown domain: {0}")]
//!     UnknownDomain(String),
//!
//!     #[error(transparent)]
//!     Common(#[from] CommonError),
//! }
//!
//! impl_error_conversion!(LoaderError, Common);
//! impl_error_classification!(LoaderError, Common,
//!     Self::UnknownDomain(_) => {
//!         retryable: false,
//!         severity: ErrorSeverity::Error,
//!         critical: false,
//!     }
//! );
//! ```

use std::fmt;
use std::time::Duration;

/// Decoding and I/O failures shared by every crate that reads envelopes
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommonError {
    /// A TOML or JSON document could not be decoded
    #[error("Failed to decode {format}: {message}")]
    Serialization { format: &'static str, message: String },

    /// Reading a file failed
    #[error("I/O error: {0}")]
    Io(String),
}

impl CommonError {
    pub fn serialization(format: &'static str, message: impl Into<String>) -> Self {
        Self::Serialization { format, message: message.into() }
    }

    /// Format name for serialization errors
    pub fn format(&self) -> Option<&'static str> {
        match self {
            Self::Serialization { format, .. } => Some(format),
            Self::Io(_) => None,
        }
    }
}

impl From<serde_json::Error> for CommonError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization("JSON", err.to_string())
    }
}

impl From<toml::de::Error> for CommonError {
    fn from(err: toml::de::Error) -> Self {
        Self::serialization("TOML", err.message())
    }
}

impl From<std::io::Error> for CommonError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl ErrorClassification for CommonError {
    fn is_retryable(&self) -> bool {
        // A file that failed to read may be mid-write
        matches!(self, Self::Io(_))
    }

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Error
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Classify errors by retryability, severity and criticality
pub trait ErrorClassification {
    /// Whether the same call may succeed if attempted again
    fn is_retryable(&self) -> bool;

    fn severity(&self) -> ErrorSeverity;

    /// Whether the error needs immediate attention
    fn is_critical(&self) -> bool;

    /// Suggested wait before trying again, if known
    fn retry_after(&self) -> Option<Duration>;
}

/// Severity levels for logging and metric labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ErrorSeverity {
    Info,
    #[default]
    Warning,
    Error,
    Critical,
}

impl ErrorSeverity {
    /// Lowercase label used for metric dimensions
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Route decoding and I/O errors into a crate error through its
/// `CommonError` variant
///
/// Generates `From<serde_json::Error>`, `From<toml::de::Error>` and
/// `From<std::io::Error>`. The calling crate must depend on `serde_json` and
/// `toml`.
#[macro_export]
macro_rules! impl_error_conversion {
    ($error_type:ty, $variant:ident) => {
        impl From<serde_json::Error> for $error_type {
            fn from(err: serde_json::Error) -> Self {
                Self::$variant($crate::error::CommonError::from(err))
            }
        }

        impl From<toml::de::Error> for $error_type {
            fn from(err: toml::de::Error) -> Self {
                Self::$variant($crate::error::CommonError::from(err))
            }
        }

        impl From<std::io::Error> for $error_type {
            fn from(err: std::io::Error) -> Self {
                Self::$variant($crate::error::CommonError::from(err))
            }
        }
    };
}

/// Implement `ErrorClassification` for a crate error, delegating its
/// `CommonError` variant and listing the rest explicitly
///
/// ```rust,ignore
/// impl_error_classification!(MyError, Common,
///     Self::Specific(_) => {
///         retryable: false,
///         severity: ErrorSeverity::Error,
///         critical: false,
///     }
/// );
/// ```
#[macro_export]
macro_rules! impl_error_classification {
    (
        $error_type:ty,
        $common_variant:ident
        $(,
            $variant:pat => {
                retryable: $retryable:expr,
                severity: $severity:expr,
                critical: $critical:expr
                $(, retry_after: $retry_after:expr)?
                $(,)?
            }
        )*
        $(,)?
    ) => {
        impl $crate::error::ErrorClassification for $error_type {
            fn is_retryable(&self) -> bool {
                match self {
                    Self::$common_variant(e) => e.is_retryable(),
                    $( $variant => $retryable, )*
                }
            }

            fn severity(&self) -> $crate::error::ErrorSeverity {
                match self {
                    Self::$common_variant(e) => e.severity(),
                    $( $variant => $severity, )*
                }
            }

            fn is_critical(&self) -> bool {
                match self {
                    Self::$common_variant(e) => e.is_critical(),
                    $( $variant => $critical, )*
                }
            }

            fn retry_after(&self) -> Option<std::time::Duration> {
                match self {
                    Self::$common_variant(e) => e.retry_after(),
                    $( $( $variant => $retry_after, )? )*
                    #[allow(unreachable_patterns)]
                    _ => None,
                }
            }
        }
    };
}
