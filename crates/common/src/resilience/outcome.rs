//! Terminal record of one logical call

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::utils::serde::duration_millis;

/// How a call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Succeeded,
    /// Policy declined, attempts exhausted, or budget spent
    Failed,
    /// Ended by an open circuit breaker
    CircuitOpen,
    Cancelled,
}

impl OutcomeKind {
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::CircuitOpen => "circuit_open",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Reported exactly once per `execute` call, to the hooks and the metrics
/// sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub kind: OutcomeKind,
    pub success: bool,
    /// Attempts actually invoked
    pub attempts: u32,
    /// The breaker was open or tripped when the call ended
    pub circuit_breaker_opened: bool,
    pub domain: String,
    pub correlation_id: String,
    /// Sum of the delays waited between attempts
    #[serde(with = "duration_millis")]
    pub total_delay: Duration,
    /// Wall-clock time from start to termination, per the call's clock
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
}

impl Outcome {
    /// Outcome with `success` and `circuit_breaker_opened` derived from
    /// `kind`
    pub fn new(
        kind: OutcomeKind,
        attempts: u32,
        domain: &str,
        correlation_id: &str,
        total_delay: Duration,
        elapsed: Duration,
    ) -> Self {
        let circuit_breaker_opened = match kind {
            OutcomeKind::Failed | OutcomeKind::CircuitOpen => true,
            OutcomeKind::Succeeded | OutcomeKind::Cancelled => false,
        };
        Self {
            kind,
            success: kind == OutcomeKind::Succeeded,
            attempts,
            circuit_breaker_opened,
            domain: domain.to_string(),
            correlation_id: correlation_id.to_string(),
            total_delay,
            elapsed,
        }
    }

    /// Average delay between attempts
    pub fn average_delay(&self) -> Duration {
        if self.attempts <= 1 {
            return Duration::ZERO;
        }
        self.total_delay / (self.attempts - 1)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for resilience::outcome.
    use super::*;

    /// Validates the success and breaker flags derived from the kind.
    ///
    /// Assertions:
    /// - Confirms only `Succeeded` sets `success`.
    /// - Confirms `Cancelled` sets neither flag.
    #[test]
    fn test_flags_follow_kind() {
        let zero = Duration::ZERO;
        let ok = Outcome::new(OutcomeKind::Succeeded, 3, "transport", "c", zero, zero);
        assert!(ok.success);
        assert!(!ok.circuit_breaker_opened);

        let failed = Outcome::new(OutcomeKind::Failed, 4, "auth", "c", zero, zero);
        assert!(!failed.success);
        assert!(failed.circuit_breaker_opened);

        let open = Outcome::new(OutcomeKind::CircuitOpen, 0, "auth", "c", zero, zero);
        assert!(open.circuit_breaker_opened);

        let cancelled = Outcome::new(OutcomeKind::Cancelled, 1, "auth", "c", zero, zero);
        assert!(!cancelled.success);
        assert!(!cancelled.circuit_breaker_opened);
    }

    #[test]
    fn test_average_delay() {
        let outcome = Outcome::new(
            OutcomeKind::Succeeded,
            3,
            "transport",
            "c",
            Duration::from_millis(600),
            Duration::from_millis(650),
        );
        assert_eq!(outcome.average_delay(), Duration::from_millis(300));
    }

    /// Validates the JSON shape used in structured logs.
    ///
    /// Assertions:
    /// - Confirms durations serialize as milliseconds.
    /// - Confirms the kind serializes in snake_case.
    #[test]
    fn test_outcome_json() {
        let outcome = Outcome::new(
            OutcomeKind::CircuitOpen,
            3,
            "auth",
            "corr-1",
            Duration::from_millis(600),
            Duration::from_millis(600),
        );
        let json = serde_json::to_value(&outcome).expect("serialize outcome");
        assert_eq!(json["kind"], "circuit_open");
        assert_eq!(json["total_delay"], 600);
        assert_eq!(json["success"], false);
    }
}
