//! Delay calculation between attempts
//!
//! `calculate_delay` maps an envelope, the number of the attempt that just
//! failed, the call's correlation id and the time already spent into the
//! wait before the next attempt:
//!
//! 1. base delay from the backoff policy, capped at `max_delay_ms`
//! 2. plus jitter from the envelope's strategy, floored at zero
//! 3. forced to zero for `none` / `immediate`
//! 4. clipped so that `elapsed + delay` never exceeds the failure budget
//!
//! Results are whole milliseconds (floor).

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::envelope::{BackoffPolicy, PolicyEnvelope};
use super::jitter::{jitter_ms, HashJitter, JitterSource};
use crate::utils::serde::duration_millis;

/// The wait scheduled after a failed attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPlan {
    /// Jittered, budget-capped delay actually applied
    #[serde(with = "duration_millis")]
    pub delay: Duration,
    /// Number of the attempt that failed
    pub attempt: u32,
    pub domain: String,
}

impl RetryPlan {
    pub fn new(domain: impl Into<String>, attempt: u32, delay: Duration) -> Self {
        Self { delay, attempt, domain: domain.into() }
    }
}

/// Pre-jitter delay in milliseconds for `attempt` (1-based)
pub fn base_delay_ms(envelope: &PolicyEnvelope, attempt: u32) -> f64 {
    let attempt = attempt.max(1);
    let initial = envelope.initial_delay_ms as f64;
    let max = envelope.max_delay_ms as f64;
    let multiplier = envelope.multiplier;

    match envelope.policy {
        BackoffPolicy::None | BackoffPolicy::Immediate => 0.0,
        BackoffPolicy::Linear => (initial + f64::from(attempt - 1) * multiplier).min(max),
        BackoffPolicy::Hybrid => match attempt {
            1 => 0.0,
            2 => initial,
            n => (initial * multiplier.powi(exponent(n - 2))).min(max),
        },
        BackoffPolicy::Exponential => (initial * multiplier.powi(exponent(attempt - 1))).min(max),
    }
}

fn exponent(n: u32) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

fn floor_millis(ms: f64) -> Duration {
    if ms.is_finite() && ms > 0.0 {
        Duration::from_millis(ms.floor() as u64)
    } else {
        Duration::ZERO
    }
}

/// Clip `delay` so that `elapsed + delay` stays within `budget`
pub fn clamp_to_budget(delay: Duration, elapsed: Duration, budget: Duration) -> Duration {
    let remaining = budget.saturating_sub(elapsed);
    if delay > remaining {
        Duration::from_millis(remaining.as_millis() as u64)
    } else {
        delay
    }
}

/// Delay calculator with a swappable jitter source
#[derive(Debug, Clone)]
pub struct DelayCalculator {
    jitter: Arc<dyn JitterSource>,
}

impl Default for DelayCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl DelayCalculator {
    /// Calculator using [`HashJitter`]
    pub fn new() -> Self {
        Self { jitter: Arc::new(HashJitter) }
    }

    pub fn with_jitter(jitter: Arc<dyn JitterSource>) -> Self {
        Self { jitter }
    }

    /// Jittered delay before budget clamping
    pub fn unclamped(
        &self,
        envelope: &PolicyEnvelope,
        attempt: u32,
        correlation_id: &str,
    ) -> Duration {
        if envelope.policy.is_zero_delay() {
            return Duration::ZERO;
        }

        let base = base_delay_ms(envelope, attempt);
        let seed = self.jitter.seed(correlation_id, attempt);
        let jittered = (base + jitter_ms(envelope.jitter_strategy, base, seed)).max(0.0);
        floor_millis(jittered)
    }

    /// Delay to wait after `attempt` failed, `elapsed` into the call
    pub fn calculate(
        &self,
        envelope: &PolicyEnvelope,
        attempt: u32,
        correlation_id: &str,
        elapsed: Duration,
    ) -> Duration {
        let delay = self.unclamped(envelope, attempt, correlation_id);
        clamp_to_budget(delay, elapsed, envelope.failure_budget())
    }

    /// Full retry plan for `attempt`
    pub fn plan(
        &self,
        envelope: &PolicyEnvelope,
        attempt: u32,
        correlation_id: &str,
        elapsed: Duration,
    ) -> RetryPlan {
        RetryPlan::new(
            envelope.domain.clone(),
            attempt,
            self.calculate(envelope, attempt, correlation_id, elapsed),
        )
    }
}

/// [`DelayCalculator::calculate`] with the default hash jitter
pub fn calculate_delay(
    envelope: &PolicyEnvelope,
    attempt: u32,
    correlation_id: &str,
    elapsed: Duration,
) -> Duration {
    DelayCalculator::new().calculate(envelope, attempt, correlation_id, elapsed)
}

/// Delay schedule a call would follow if every attempt failed
///
/// One plan per retry (`max_attempts - 1` entries). The failure budget is
/// not applied since elapsed time depends on the operation.
pub fn preview_schedule(envelope: &PolicyEnvelope, correlation_id: &str) -> Vec<RetryPlan> {
    let calculator = DelayCalculator::new();
    (1..envelope.max_attempts)
        .map(|attempt| {
            RetryPlan::new(
                envelope.domain.clone(),
                attempt,
                calculator.unclamped(envelope, attempt, correlation_id),
            )
        })
        .collect()
}
