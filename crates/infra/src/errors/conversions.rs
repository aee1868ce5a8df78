//! Conversions from external errors into [`InfraError`].

use voxguard_common::error::{ErrorClassification, ErrorSeverity};
use voxguard_common::{impl_error_classification, impl_error_conversion};

use super::InfraError;

// serde_json, toml and io errors route through CommonError.
impl_error_conversion!(InfraError, Common);

impl_error_classification!(InfraError, Common,
    Self::Config(_) => {
        retryable: false,
        severity: ErrorSeverity::Error,
        critical: true,
    },
    Self::Envelope(_) => {
        retryable: false,
        severity: ErrorSeverity::Error,
        critical: true,
    },
    Self::Metrics(_) => {
        retryable: false,
        severity: ErrorSeverity::Warning,
        critical: false,
    },
);

#[cfg(test)]
mod tests {
    use voxguard_common::error::CommonError;
    use voxguard_common::resilience::PolicyEnvelope;

    use super::*;

    /// Validates JSON parse errors arrive as common serialization errors.
    ///
    /// Assertions:
    /// - Confirms the `Common(Serialization)` variant.
    /// - Confirms the error is not retryable.
    #[test]
    fn test_json_error_routes_through_common() {
        let err: InfraError = serde_json::from_str::<PolicyEnvelope>("{ nope")
            .map_err(InfraError::from)
            .unwrap_err();

        assert!(matches!(err, InfraError::Common(CommonError::Serialization { .. })));
        assert!(!err.is_retryable());
    }

    /// Validates TOML parse errors carry the format.
    ///
    /// Assertions:
    /// - Confirms the serialization format is `TOML`.
    #[test]
    fn test_toml_error_conversion() {
        let err: InfraError =
            toml::from_str::<PolicyEnvelope>("domain = ").map_err(InfraError::from).unwrap_err();

        match err {
            InfraError::Common(CommonError::Serialization { format, .. }) => {
                assert_eq!(format, "TOML");
            }
            other => panic!("expected serialization error, got {:?}", other),
        }
    }

    /// Validates envelope validation failures are critical configuration
    /// problems.
    ///
    /// Assertions:
    /// - Confirms severity `Error` and `is_critical`.
    /// - Confirms no retry hint.
    #[test]
    fn test_envelope_error_classification() {
        let invalid = PolicyEnvelope { max_attempts: 0, ..PolicyEnvelope::auth() };
        let err = InfraError::from(invalid.validate().unwrap_err());

        assert_eq!(err.severity(), ErrorSeverity::Error);
        assert!(err.is_critical());
        assert_eq!(err.retry_after(), None);
        assert!(err.to_string().contains("max_attempts"));
    }
}
