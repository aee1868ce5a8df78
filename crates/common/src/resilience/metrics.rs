//! Metrics emitted by the retry executor
//!
//! The executor reports through [`RetryMetricsSink`]: one
//! `increment_attempt` per failed attempt and one `record_outcome` per
//! call. [`CollectorMetricsSink`] maps those events onto any generic
//! [`MetricsCollector`] backend.

use std::fmt::Debug;
use std::sync::Arc;

use super::outcome::Outcome;
use crate::error::ErrorSeverity;
use crate::observability::traits::{MetricsCollector, NoOpMetricsCollector};

/// Counter of failed attempts
pub const METRIC_RETRY_ATTEMPTS: &str = "voxguard_retry_attempts_total";
/// Counter of terminated calls
pub const METRIC_RETRY_OUTCOMES: &str = "voxguard_retry_outcomes_total";
/// Histogram of total delay per call, in milliseconds
pub const METRIC_RETRY_DELAY_MS: &str = "voxguard_retry_delay_ms";
/// Gauge set to 1 while a domain's breaker is open
pub const METRIC_CIRCUIT_OPEN: &str = "voxguard_circuit_breaker_open";

/// Context attached to every metric event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricMetadata {
    pub operation: String,
    pub correlation_id: String,
    /// Attempt number the event refers to (attempts made, for outcomes)
    pub attempt: u32,
}

/// Sink for retry telemetry
pub trait RetryMetricsSink: Send + Sync + Debug {
    /// Called exactly once per failed attempt
    fn increment_attempt(&self, domain: &str, severity: ErrorSeverity, metadata: &MetricMetadata);

    /// Called exactly once per `execute` call
    fn record_outcome(&self, domain: &str, outcome: &Outcome, metadata: &MetricMetadata);
}

/// Sink that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetricsSink;

impl RetryMetricsSink for NoOpMetricsSink {
    fn increment_attempt(
        &self,
        _domain: &str,
        _severity: ErrorSeverity,
        _metadata: &MetricMetadata,
    ) {
    }

    fn record_outcome(&self, _domain: &str, _outcome: &Outcome, _metadata: &MetricMetadata) {}
}

/// Adapts a generic [`MetricsCollector`] into a [`RetryMetricsSink`]
#[derive(Debug, Clone)]
pub struct CollectorMetricsSink {
    collector: Arc<dyn MetricsCollector>,
}

impl CollectorMetricsSink {
    pub fn new(collector: Arc<dyn MetricsCollector>) -> Self {
        Self { collector }
    }
}

impl Default for CollectorMetricsSink {
    fn default() -> Self {
        Self::new(Arc::new(NoOpMetricsCollector))
    }
}

impl RetryMetricsSink for CollectorMetricsSink {
    fn increment_attempt(&self, domain: &str, severity: ErrorSeverity, metadata: &MetricMetadata) {
        self.collector.increment_counter(
            METRIC_RETRY_ATTEMPTS,
            &[
                ("domain", domain),
                ("severity", severity.as_label()),
                ("operation", metadata.operation.as_str()),
            ],
        );
    }

    fn record_outcome(&self, domain: &str, outcome: &Outcome, metadata: &MetricMetadata) {
        let success = if outcome.success { "true" } else { "false" };
        self.collector.increment_counter(
            METRIC_RETRY_OUTCOMES,
            &[
                ("domain", domain),
                ("kind", outcome.kind.as_label()),
                ("success", success),
                ("operation", metadata.operation.as_str()),
            ],
        );
        self.collector.record_timing(
            METRIC_RETRY_DELAY_MS,
            outcome.total_delay.as_millis() as u64,
            &[("domain", domain)],
        );
        let open = if outcome.circuit_breaker_opened { 1.0 } else { 0.0 };
        self.collector.record_gauge(METRIC_CIRCUIT_OPEN, open, &[("domain", domain)]);
    }
}
