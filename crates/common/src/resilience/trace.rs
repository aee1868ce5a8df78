//! Structured log events for one logical call
//!
//! Every event carries `domain`, `correlation_id` and `operation` so calls
//! can be followed across interleaved log output.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::outcome::{Outcome, OutcomeKind};

/// Log emitter bound to one call
#[derive(Debug, Clone)]
pub(crate) struct RetrySpan<'a> {
    domain: &'a str,
    correlation_id: &'a str,
    operation: &'a str,
}

impl<'a> RetrySpan<'a> {
    pub(crate) fn start(
        domain: &'a str,
        correlation_id: &'a str,
        operation: &'a str,
        max_attempts: u32,
    ) -> Self {
        debug!(
            domain = domain,
            correlation_id = correlation_id,
            operation = operation,
            max_attempts = max_attempts,
            "Starting retry operation"
        );
        Self { domain, correlation_id, operation }
    }

    pub(crate) fn record_attempt(&self, attempt: u32) {
        debug!(
            domain = self.domain,
            correlation_id = self.correlation_id,
            operation = self.operation,
            attempt = attempt,
            "Executing attempt"
        );
    }

    pub(crate) fn record_failure(&self, attempt: u32, consecutive_failures: u32) {
        warn!(
            domain = self.domain,
            correlation_id = self.correlation_id,
            operation = self.operation,
            attempt = attempt,
            consecutive_failures = consecutive_failures,
            "Attempt failed"
        );
    }

    pub(crate) fn record_scheduled(&self, attempt: u32, delay: Duration) {
        info!(
            domain = self.domain,
            correlation_id = self.correlation_id,
            operation = self.operation,
            attempt = attempt,
            delay_ms = delay.as_millis() as u64,
            "Retry scheduled"
        );
    }

    pub(crate) fn record_circuit_open(&self, attempt: u32) {
        warn!(
            domain = self.domain,
            correlation_id = self.correlation_id,
            operation = self.operation,
            attempt = attempt,
            "Circuit breaker is open, failing fast"
        );
    }

    pub(crate) fn record_budget_exhausted(&self, elapsed: Duration) {
        warn!(
            domain = self.domain,
            correlation_id = self.correlation_id,
            operation = self.operation,
            elapsed_ms = elapsed.as_millis() as u64,
            "Failure budget exhausted"
        );
    }

    pub(crate) fn record_cancelled(&self, attempt: u32) {
        info!(
            domain = self.domain,
            correlation_id = self.correlation_id,
            operation = self.operation,
            attempt = attempt,
            "Retry cancelled"
        );
    }

    pub(crate) fn finish(self, outcome: &Outcome) {
        match outcome.kind {
            OutcomeKind::Succeeded => info!(
                domain = self.domain,
                correlation_id = self.correlation_id,
                operation = self.operation,
                attempts = outcome.attempts,
                total_delay_ms = outcome.total_delay.as_millis() as u64,
                "Retry operation succeeded"
            ),
            kind => warn!(
                domain = self.domain,
                correlation_id = self.correlation_id,
                operation = self.operation,
                attempts = outcome.attempts,
                outcome = %kind,
                total_delay_ms = outcome.total_delay.as_millis() as u64,
                "Retry operation ended without success"
            ),
        }
    }
}
