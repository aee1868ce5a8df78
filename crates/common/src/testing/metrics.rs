//! In-memory metrics sink for assertions
//!
//! ```
//! use voxguard_common::error::ErrorSeverity;
//! use voxguard_common::resilience::{MetricMetadata, RetryMetricsSink};
//! use voxguard_common::testing::RecordingMetricsSink;
//!
//! let sink = RecordingMetricsSink::new();
//! let metadata = MetricMetadata {
//!     operation: "renew".to_string(),
//!     correlation_id: "corr".to_string(),
//!     attempt: 1,
//! };
//! sink.increment_attempt("session", ErrorSeverity::Warning, &metadata);
//! assert_eq!(sink.attempt_count(), 1);
//! ```

use parking_lot::Mutex;

use crate::error::ErrorSeverity;
use crate::resilience::{MetricMetadata, Outcome, RetryMetricsSink};

/// One recorded `increment_attempt` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptEvent {
    pub domain: String,
    pub severity: ErrorSeverity,
    pub metadata: MetricMetadata,
}

/// Captures every metric event in call order
#[derive(Debug, Default)]
pub struct RecordingMetricsSink {
    attempts: Mutex<Vec<AttemptEvent>>,
    outcomes: Mutex<Vec<Outcome>>,
}

impl RecordingMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> Vec<AttemptEvent> {
        self.attempts.lock().clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().len()
    }

    pub fn outcomes(&self) -> Vec<Outcome> {
        self.outcomes.lock().clone()
    }

    /// Outcomes recorded for one correlation id
    pub fn outcomes_for(&self, correlation_id: &str) -> Vec<Outcome> {
        self.outcomes
            .lock()
            .iter()
            .filter(|outcome| outcome.correlation_id == correlation_id)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.attempts.lock().clear();
        self.outcomes.lock().clear();
    }
}

impl RetryMetricsSink for RecordingMetricsSink {
    fn increment_attempt(&self, domain: &str, severity: ErrorSeverity, metadata: &MetricMetadata) {
        self.attempts.lock().push(AttemptEvent {
            domain: domain.to_string(),
            severity,
            metadata: metadata.clone(),
        });
    }

    fn record_outcome(&self, _domain: &str, outcome: &Outcome, _metadata: &MetricMetadata) {
        self.outcomes.lock().push(outcome.clone());
    }
}
