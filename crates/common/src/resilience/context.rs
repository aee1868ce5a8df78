//! Per-call inputs to the retry executor

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::clock::{Clock, SystemClock};
use super::envelope::PolicyEnvelope;
use super::metrics::{NoOpMetricsSink, RetryMetricsSink};
use crate::error::ErrorSeverity;

/// Everything one logical call needs besides the operation itself
///
/// Defaults: a fresh v4 correlation id, [`SystemClock`],
/// [`NoOpMetricsSink`], `Warning` severity and no cancellation token.
pub struct RetryContext<H> {
    pub correlation_id: String,
    pub operation: String,
    pub envelope: PolicyEnvelope,
    pub clock: Arc<dyn Clock>,
    pub metrics: Arc<dyn RetryMetricsSink>,
    /// Severity label attached to attempt metrics
    pub severity: ErrorSeverity,
    pub cancellation: Option<CancellationToken>,
    pub hooks: H,
}

impl<H> RetryContext<H> {
    pub fn new(operation: impl Into<String>, envelope: PolicyEnvelope, hooks: H) -> Self {
        Self {
            correlation_id: Uuid::new_v4().to_string(),
            operation: operation.into(),
            envelope,
            clock: Arc::new(SystemClock),
            metrics: Arc::new(NoOpMetricsSink),
            severity: ErrorSeverity::Warning,
            cancellation: None,
            hooks,
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn RetryMetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn domain(&self) -> &str {
        &self.envelope.domain
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}

impl<H> fmt::Debug for RetryContext<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryContext")
            .field("correlation_id", &self.correlation_id)
            .field("operation", &self.operation)
            .field("envelope", &self.envelope)
            .field("severity", &self.severity)
            .field("cancellable", &self.cancellation.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for resilience::context.
    use super::*;

    #[test]
    fn test_context_defaults() {
        let ctx = RetryContext::new("acquire_token", PolicyEnvelope::auth(), ());

        assert_eq!(ctx.domain(), "auth");
        assert_eq!(ctx.operation, "acquire_token");
        assert_eq!(ctx.severity, ErrorSeverity::Warning);
        assert!(Uuid::parse_str(&ctx.correlation_id).is_ok());
        assert!(!ctx.is_cancelled());
    }

    /// Validates generated correlation ids are unique per call.
    ///
    /// Assertions:
    /// - Ensures two contexts get different ids.
    #[test]
    fn test_correlation_ids_unique() {
        let a = RetryContext::new("op", PolicyEnvelope::transport(), ());
        let b = RetryContext::new("op", PolicyEnvelope::transport(), ());
        assert_ne!(a.correlation_id, b.correlation_id);
    }

    #[test]
    fn test_context_cancellation() {
        let token = CancellationToken::new();
        let ctx = RetryContext::new("op", PolicyEnvelope::session(), ())
            .with_correlation_id("corr-9")
            .with_cancellation(token.clone());

        assert_eq!(ctx.correlation_id, "corr-9");
        token.cancel();
        assert!(ctx.is_cancelled());
    }
}
