//! The retry executor: attempt loop, breaker checks and telemetry
//!
//! One `execute` call is one logical operation. The loop:
//!
//! 1. fails fast if the domain's breaker is open (checked before every
//!    attempt, so a breaker tripped by a concurrent call also ends this one)
//! 2. invokes the operation
//! 3. on failure counts the failure against the domain, emits one attempt
//!    metric, computes the next plan and asks the hooks for a decision
//! 4. trips the breaker when the domain reaches its consecutive-failure
//!    threshold, or when the call ends (policy declined, attempts spent,
//!    budget spent)
//! 5. otherwise waits on the context's clock and goes again
//!
//! Every terminated call reports exactly one outcome to the metrics sink and
//! to `on_complete`.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::instrument;

use super::circuit_breaker::{BreakerSnapshot, CircuitBreakerRegistry};
use super::context::RetryContext;
use super::delay::{clamp_to_budget, DelayCalculator, RetryPlan};
use super::error::{RetryError, RetryResult};
use super::hooks::{FailureInfo, RetryHooks};
use super::jitter::JitterSource;
use super::metrics::MetricMetadata;
use super::outcome::{Outcome, OutcomeKind};
use super::trace::RetrySpan;

/// Executes fallible async operations under a policy envelope
///
/// The executor is cheap to clone and shares its breaker registry with every
/// clone.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    registry: Arc<CircuitBreakerRegistry>,
    delays: DelayCalculator,
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(Arc::new(CircuitBreakerRegistry::new()))
    }
}

impl RetryExecutor {
    pub fn new(registry: Arc<CircuitBreakerRegistry>) -> Self {
        Self { registry, delays: DelayCalculator::new() }
    }

    /// Replace the default hash jitter
    pub fn with_jitter(mut self, jitter: Arc<dyn JitterSource>) -> Self {
        self.delays = DelayCalculator::with_jitter(jitter);
        self
    }

    pub fn registry(&self) -> &Arc<CircuitBreakerRegistry> {
        &self.registry
    }

    /// Breaker state for `domain`
    pub fn circuit_breaker_state(&self, domain: &str) -> BreakerSnapshot {
        self.registry.state(domain)
    }

    /// Run `operation` until it succeeds or the envelope ends the call
    ///
    /// # Errors
    /// - [`RetryError::InvalidEnvelope`] before any attempt if the envelope
    ///   fails validation
    /// - [`RetryError::CircuitOpen`] with the error from `on_circuit_open`
    /// - [`RetryError::Exhausted`] with the error from the final
    ///   `on_failure` decision
    /// - [`RetryError::Cancelled`] if the context's token fires
    #[instrument(
        skip_all,
        fields(
            domain = %context.envelope.domain,
            correlation_id = %context.correlation_id,
            operation = %context.operation,
        )
    )]
    pub async fn execute<T, E, F, Fut, H>(
        &self,
        mut operation: F,
        context: &RetryContext<H>,
    ) -> RetryResult<T, H::Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        H: RetryHooks<E>,
    {
        let envelope = &context.envelope;
        envelope.validate()?;

        let domain = envelope.domain.as_str();
        let clock = context.clock.as_ref();
        let start = clock.now();
        let span = RetrySpan::start(
            domain,
            &context.correlation_id,
            &context.operation,
            envelope.max_attempts,
        );

        let mut attempt: u32 = 1;
        let mut total_delay = Duration::ZERO;

        loop {
            if context.is_cancelled() {
                span.record_cancelled(attempt);
                self.finish::<E, H>(
                    context,
                    span,
                    OutcomeKind::Cancelled,
                    attempt - 1,
                    total_delay,
                    start,
                );
                return Err(RetryError::Cancelled { attempts: attempt - 1 });
            }

            let now = clock.now();
            if let Some(snapshot) = self.registry.open_snapshot(domain, now) {
                span.record_circuit_open(attempt);
                let source = context.hooks.on_circuit_open(&snapshot);
                let retry_after = snapshot.remaining(now);
                self.finish::<E, H>(
                    context,
                    span,
                    OutcomeKind::CircuitOpen,
                    attempt - 1,
                    total_delay,
                    start,
                );
                return Err(RetryError::CircuitOpen {
                    source,
                    domain: domain.to_string(),
                    retry_after,
                });
            }

            span.record_attempt(attempt);
            let result = match &context.cancellation {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => None,
                    result = operation() => Some(result),
                },
                None => Some(operation().await),
            };

            let Some(result) = result else {
                span.record_cancelled(attempt);
                self.finish::<E, H>(
                    context,
                    span,
                    OutcomeKind::Cancelled,
                    attempt,
                    total_delay,
                    start,
                );
                return Err(RetryError::Cancelled { attempts: attempt });
            };

            let error = match result {
                Ok(value) => {
                    self.registry.record_success(domain);
                    self.finish::<E, H>(
                        context,
                        span,
                        OutcomeKind::Succeeded,
                        attempt,
                        total_delay,
                        start,
                    );
                    return Ok(value);
                }
                Err(error) => error,
            };

            let consecutive_failures = self.registry.record_failure(domain);
            span.record_failure(attempt, consecutive_failures);
            context.metrics.increment_attempt(
                domain,
                context.severity,
                &metadata(context, attempt),
            );

            let elapsed = clock.now().saturating_duration_since(start);
            let computed_plan =
                self.delays.plan(envelope, attempt, &context.correlation_id, elapsed);
            let decision = context.hooks.on_failure(FailureInfo {
                attempt,
                max_attempts: envelope.max_attempts,
                retry_plan: computed_plan.clone(),
                error,
                elapsed,
                domain: domain.to_string(),
                correlation_id: context.correlation_id.clone(),
                operation: context.operation.clone(),
                consecutive_failures,
            });

            let threshold_reached = envelope
                .consecutive_failure_threshold
                .is_some_and(|threshold| consecutive_failures >= threshold);
            if threshold_reached {
                let snapshot = self.registry.trip(domain, clock.now(), envelope.cool_down());
                let source = context.hooks.on_circuit_open(&snapshot);
                self.finish::<E, H>(
                    context,
                    span,
                    OutcomeKind::CircuitOpen,
                    attempt,
                    total_delay,
                    start,
                );
                return Err(RetryError::CircuitOpen {
                    source,
                    domain: domain.to_string(),
                    retry_after: Some(envelope.cool_down()),
                });
            }

            let budget = envelope.failure_budget();
            let budget_exhausted = elapsed >= budget;
            if !decision.should_retry || attempt >= envelope.max_attempts || budget_exhausted {
                if budget_exhausted {
                    span.record_budget_exhausted(elapsed);
                }
                self.registry.trip(domain, clock.now(), envelope.cool_down());
                self.finish::<E, H>(
                    context,
                    span,
                    OutcomeKind::Failed,
                    attempt,
                    total_delay,
                    start,
                );
                return Err(RetryError::Exhausted { source: decision.error, attempts: attempt });
            }

            let plan = match decision.retry_plan {
                Some(plan) => RetryPlan {
                    delay: clamp_to_budget(plan.delay, elapsed, budget),
                    attempt,
                    domain: domain.to_string(),
                },
                None => computed_plan,
            };

            context.hooks.on_retry_scheduled(&plan);
            span.record_scheduled(attempt, plan.delay);

            let waited = match &context.cancellation {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => false,
                    _ = clock.wait(plan.delay) => true,
                },
                None => {
                    clock.wait(plan.delay).await;
                    true
                }
            };

            if !waited {
                span.record_cancelled(attempt);
                self.finish::<E, H>(
                    context,
                    span,
                    OutcomeKind::Cancelled,
                    attempt,
                    total_delay,
                    start,
                );
                return Err(RetryError::Cancelled { attempts: attempt });
            }

            total_delay += plan.delay;
            attempt += 1;
        }
    }

    fn finish<E, H>(
        &self,
        context: &RetryContext<H>,
        span: RetrySpan<'_>,
        kind: OutcomeKind,
        attempts: u32,
        total_delay: Duration,
        start: Instant,
    ) where
        H: RetryHooks<E>,
    {
        let elapsed = context.clock.now().saturating_duration_since(start);
        let outcome = Outcome::new(
            kind,
            attempts,
            context.domain(),
            &context.correlation_id,
            total_delay,
            elapsed,
        );

        context.metrics.record_outcome(context.domain(), &outcome, &metadata(context, attempts));
        context.hooks.on_complete(&outcome);
        span.finish(&outcome);
    }
}

fn metadata<H>(context: &RetryContext<H>, attempt: u32) -> MetricMetadata {
    MetricMetadata {
        operation: context.operation.clone(),
        correlation_id: context.correlation_id.clone(),
        attempt,
    }
}
