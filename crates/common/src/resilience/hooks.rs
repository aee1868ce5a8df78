//! Caller callbacks driving the retry loop
//!
//! The executor never constructs domain errors itself. After every failed
//! attempt it hands the raw error to [`RetryHooks::on_failure`], which maps
//! it into the caller's error type and decides whether to continue. When a
//! breaker ends the call, [`RetryHooks::on_circuit_open`] produces the error
//! instead.

use std::time::Duration;

use super::circuit_breaker::BreakerSnapshot;
use super::delay::RetryPlan;
use super::outcome::Outcome;

/// Everything known about one failed attempt
#[derive(Debug)]
pub struct FailureInfo<E> {
    /// Number of the attempt that failed (1-based)
    pub attempt: u32,
    pub max_attempts: u32,
    /// Plan the executor will apply unless the decision overrides it
    pub retry_plan: RetryPlan,
    pub error: E,
    /// Time since the call started
    pub elapsed: Duration,
    pub domain: String,
    pub correlation_id: String,
    pub operation: String,
    /// Consecutive failures recorded for the domain, this one included
    pub consecutive_failures: u32,
}

/// Caller verdict for a failed attempt
#[derive(Debug)]
pub struct FailureDecision<D> {
    /// Mapped domain error, returned if the call ends here
    pub error: D,
    pub should_retry: bool,
    /// Replaces the computed plan; still clipped to the failure budget
    pub retry_plan: Option<RetryPlan>,
}

impl<D> FailureDecision<D> {
    /// Retry with the computed plan
    pub fn retry(error: D) -> Self {
        Self { error, should_retry: true, retry_plan: None }
    }

    /// End the call with `error`
    pub fn stop(error: D) -> Self {
        Self { error, should_retry: false, retry_plan: None }
    }

    /// Retry with a caller-chosen plan
    pub fn retry_with(error: D, plan: RetryPlan) -> Self {
        Self { error, should_retry: true, retry_plan: Some(plan) }
    }
}

/// Strategy object for the four executor callbacks
///
/// `E` is the operation's raw error; [`RetryHooks::Error`] is the domain
/// error surfaced to the caller.
pub trait RetryHooks<E>: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Map a failed attempt into a decision
    fn on_failure(&self, info: FailureInfo<E>) -> FailureDecision<Self::Error>;

    /// Produce the error returned when the breaker ends the call
    fn on_circuit_open(&self, state: &BreakerSnapshot) -> Self::Error;

    /// Called once per scheduled retry, before waiting
    fn on_retry_scheduled(&self, _plan: &RetryPlan) {}

    /// Called exactly once per call with the terminal outcome
    fn on_complete(&self, _outcome: &Outcome) {}
}

type FailureFn<E, D> = Box<dyn Fn(FailureInfo<E>) -> FailureDecision<D> + Send + Sync>;
type CircuitOpenFn<D> = Box<dyn Fn(&BreakerSnapshot) -> D + Send + Sync>;
type PlanFn = Box<dyn Fn(&RetryPlan) + Send + Sync>;
type CompleteFn = Box<dyn Fn(&Outcome) + Send + Sync>;

/// Closure-backed [`RetryHooks`] for ad-hoc callers
///
/// ```
/// use voxguard_common::resilience::{FailureDecision, FnHooks};
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("session renewal failed: {0}")]
/// struct RenewalError(String);
///
/// let hooks = FnHooks::new(
///     |info: voxguard_common::resilience::FailureInfo<std::io::Error>| {
///         FailureDecision::retry(RenewalError(info.error.to_string()))
///     },
///     |state| RenewalError(format!("breaker {} for {}", state.state, state.domain)),
/// )
/// .with_on_complete(|outcome| assert!(outcome.attempts >= 1));
/// # let _ = hooks;
/// ```
pub struct FnHooks<E, D> {
    on_failure: FailureFn<E, D>,
    on_circuit_open: CircuitOpenFn<D>,
    on_retry_scheduled: Option<PlanFn>,
    on_complete: Option<CompleteFn>,
}

impl<E, D> FnHooks<E, D> {
    pub fn new<F, C>(on_failure: F, on_circuit_open: C) -> Self
    where
        F: Fn(FailureInfo<E>) -> FailureDecision<D> + Send + Sync + 'static,
        C: Fn(&BreakerSnapshot) -> D + Send + Sync + 'static,
    {
        Self {
            on_failure: Box::new(on_failure),
            on_circuit_open: Box::new(on_circuit_open),
            on_retry_scheduled: None,
            on_complete: None,
        }
    }

    pub fn with_on_retry_scheduled<F>(mut self, callback: F) -> Self
    where
        F: Fn(&RetryPlan) + Send + Sync + 'static,
    {
        self.on_retry_scheduled = Some(Box::new(callback));
        self
    }

    pub fn with_on_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Outcome) + Send + Sync + 'static,
    {
        self.on_complete = Some(Box::new(callback));
        self
    }
}

impl<E, D> std::fmt::Debug for FnHooks<E, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHooks")
            .field("on_retry_scheduled", &self.on_retry_scheduled.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .finish_non_exhaustive()
    }
}

impl<E, D> RetryHooks<E> for FnHooks<E, D>
where
    D: std::error::Error + Send + Sync + 'static,
{
    type Error = D;

    fn on_failure(&self, info: FailureInfo<E>) -> FailureDecision<D> {
        (self.on_failure)(info)
    }

    fn on_circuit_open(&self, state: &BreakerSnapshot) -> D {
        (self.on_circuit_open)(state)
    }

    fn on_retry_scheduled(&self, plan: &RetryPlan) {
        if let Some(callback) = &self.on_retry_scheduled {
            callback(plan);
        }
    }

    fn on_complete(&self, outcome: &Outcome) {
        if let Some(callback) = &self.on_complete {
            callback(outcome);
        }
    }
}
