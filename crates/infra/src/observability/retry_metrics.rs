//! Prometheus sink for retry executor telemetry
//!
//! Every metric is registered on a registry the sink owns (or one passed
//! in), so several sinks can coexist in one process and tests stay
//! isolated.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder,
};
use voxguard_common::error::ErrorSeverity;
use voxguard_common::resilience::{
    MetricMetadata, Outcome, OutcomeKind, RetryMetricsSink, METRIC_CIRCUIT_OPEN,
    METRIC_RETRY_ATTEMPTS, METRIC_RETRY_DELAY_MS, METRIC_RETRY_OUTCOMES,
};

use crate::errors::{InfraError, InfraResult};

/// Buckets for total retry delay per call, in milliseconds
const DELAY_BUCKETS_MS: [f64; 10] =
    [0.0, 50.0, 100.0, 250.0, 500.0, 1_000.0, 2_500.0, 5_000.0, 15_000.0, 60_000.0];

/// [`RetryMetricsSink`] backed by Prometheus collectors
#[derive(Clone)]
pub struct PrometheusMetricsSink {
    registry: Registry,
    /// Failed attempts by domain, severity, operation
    attempts: IntCounterVec,
    /// Terminal outcomes by domain and kind
    outcomes: IntCounterVec,
    /// Total time spent waiting between attempts per call
    delay: HistogramVec,
    /// 1 while the last outcome for a domain left its breaker open
    circuit_open: IntGaugeVec,
}

impl std::fmt::Debug for PrometheusMetricsSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusMetricsSink").finish_non_exhaustive()
    }
}

impl PrometheusMetricsSink {
    /// Sink with its own registry
    ///
    /// # Errors
    /// Returns `InfraError::Metrics` if a collector fails to build.
    pub fn new() -> InfraResult<Self> {
        Self::with_registry(Registry::new())
    }

    /// Sink registering its collectors on `registry`
    ///
    /// # Errors
    /// Returns `InfraError::Metrics` if a collector is already registered
    /// under the same name.
    pub fn with_registry(registry: Registry) -> InfraResult<Self> {
        let attempts = IntCounterVec::new(
            Opts::new(METRIC_RETRY_ATTEMPTS, "Failed attempts made by the retry executor"),
            &["domain", "severity", "operation"],
        )?;
        registry.register(Box::new(attempts.clone()))?;

        let outcomes = IntCounterVec::new(
            Opts::new(METRIC_RETRY_OUTCOMES, "Terminal outcomes of retry executor calls"),
            &["domain", "outcome"],
        )?;
        registry.register(Box::new(outcomes.clone()))?;

        let delay = HistogramVec::new(
            HistogramOpts::new(METRIC_RETRY_DELAY_MS, "Total retry delay per call in milliseconds")
                .buckets(DELAY_BUCKETS_MS.to_vec()),
            &["domain"],
        )?;
        registry.register(Box::new(delay.clone()))?;

        let circuit_open = IntGaugeVec::new(
            Opts::new(METRIC_CIRCUIT_OPEN, "Whether the domain's circuit breaker is open"),
            &["domain"],
        )?;
        registry.register(Box::new(circuit_open.clone()))?;

        Ok(Self { registry, attempts, outcomes, delay, circuit_open })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render every metric in the Prometheus text exposition format
    ///
    /// # Errors
    /// Returns `InfraError` if encoding fails.
    pub fn render(&self) -> InfraResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| InfraError::config(e.to_string()))
    }

    /// Current attempt count for a label set
    pub fn attempt_total(&self, domain: &str, severity: ErrorSeverity, operation: &str) -> u64 {
        self.attempts.with_label_values(&[domain, severity.as_label(), operation]).get()
    }

    /// Current outcome count for a domain and kind
    pub fn outcome_total(&self, domain: &str, kind: OutcomeKind) -> u64 {
        self.outcomes.with_label_values(&[domain, kind.as_label()]).get()
    }

    /// Whether the gauge currently reports `domain` open
    pub fn circuit_open(&self, domain: &str) -> bool {
        self.circuit_open.with_label_values(&[domain]).get() == 1
    }
}

impl RetryMetricsSink for PrometheusMetricsSink {
    fn increment_attempt(&self, domain: &str, severity: ErrorSeverity, metadata: &MetricMetadata) {
        self.attempts
            .with_label_values(&[domain, severity.as_label(), metadata.operation.as_str()])
            .inc();
    }

    fn record_outcome(&self, domain: &str, outcome: &Outcome, _metadata: &MetricMetadata) {
        self.outcomes.with_label_values(&[domain, outcome.kind.as_label()]).inc();
        self.delay.with_label_values(&[domain]).observe(outcome.total_delay.as_millis() as f64);

        match outcome.kind {
            OutcomeKind::Succeeded => self.circuit_open.with_label_values(&[domain]).set(0),
            OutcomeKind::Failed | OutcomeKind::CircuitOpen => {
                self.circuit_open.with_label_values(&[domain]).set(1);
            }
            OutcomeKind::Cancelled => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use voxguard_common::resilience::{
        CircuitBreakerRegistry, FailureDecision, FnHooks, JitterStrategy, PolicyEnvelope,
        RetryContext, RetryExecutor,
    };
    use voxguard_common::testing::MockClock;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct TestError(String);

    fn hooks() -> FnHooks<String, TestError> {
        FnHooks::new(
            |info: voxguard_common::resilience::FailureInfo<String>| {
                FailureDecision::retry(TestError(info.error))
            },
            |state| TestError(format!("{} open", state.domain)),
        )
    }

    /// Validates a failing call is reflected in every collector.
    ///
    /// Assertions:
    /// - Confirms one attempt per failure under the context severity.
    /// - Confirms one `failed` outcome and the breaker gauge set.
    /// - Confirms the rendered output names each metric.
    #[tokio::test]
    async fn test_executor_updates_prometheus() {
        let sink = Arc::new(PrometheusMetricsSink::new().unwrap());
        let envelope = PolicyEnvelope::builder("transport")
            .max_attempts(3)
            .jitter_strategy(JitterStrategy::None)
            .consecutive_failure_threshold(None)
            .build()
            .unwrap();
        let ctx = RetryContext::new("negotiate", envelope, hooks())
            .with_clock(Arc::new(MockClock::new()))
            .with_metrics(sink.clone());
        let executor = RetryExecutor::new(Arc::new(CircuitBreakerRegistry::new()));

        let result = executor.execute(|| async { Err::<(), _>("503".to_string()) }, &ctx).await;

        assert!(result.is_err());
        assert_eq!(sink.attempt_total("transport", ErrorSeverity::Warning, "negotiate"), 3);
        assert_eq!(sink.outcome_total("transport", OutcomeKind::Failed), 1);
        assert!(sink.circuit_open("transport"));

        let rendered = sink.render().unwrap();
        assert!(rendered.contains(METRIC_RETRY_ATTEMPTS));
        assert!(rendered.contains(METRIC_RETRY_OUTCOMES));
        assert!(rendered.contains(METRIC_RETRY_DELAY_MS));
        assert!(rendered.contains(METRIC_CIRCUIT_OPEN));
    }

    /// Validates a success clears the breaker gauge.
    ///
    /// Assertions:
    /// - Confirms the gauge drops back to 0.
    #[test]
    fn test_success_clears_gauge() {
        let sink = PrometheusMetricsSink::new().unwrap();
        let metadata = MetricMetadata {
            operation: "renew".to_string(),
            correlation_id: "c".to_string(),
            attempt: 1,
        };
        let failed = Outcome {
            kind: OutcomeKind::Failed,
            success: false,
            attempts: 1,
            circuit_breaker_opened: true,
            domain: "session".to_string(),
            correlation_id: "c".to_string(),
            total_delay: Duration::ZERO,
            elapsed: Duration::from_millis(5),
        };
        let succeeded = Outcome {
            kind: OutcomeKind::Succeeded,
            success: true,
            circuit_breaker_opened: false,
            ..failed.clone()
        };

        sink.record_outcome("session", &failed, &metadata);
        assert!(sink.circuit_open("session"));
        sink.record_outcome("session", &succeeded, &metadata);
        assert!(!sink.circuit_open("session"));
        assert_eq!(sink.outcome_total("session", OutcomeKind::Succeeded), 1);
    }

    /// Validates two sinks cannot share a registry.
    ///
    /// Assertions:
    /// - Confirms the second registration fails with `Metrics`.
    #[test]
    fn test_duplicate_registration_rejected() {
        let registry = Registry::new();
        let _first = PrometheusMetricsSink::with_registry(registry.clone()).unwrap();

        let second = PrometheusMetricsSink::with_registry(registry);
        assert!(matches!(second, Err(InfraError::Metrics(_))));
    }
}
