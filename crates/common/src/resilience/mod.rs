//! Retry and circuit-breaker execution for fallible async operations
//!
//! This module wraps calls such as Azure authentication, realtime transport
//! negotiation and session renewal with:
//! - **Policy envelopes**: one static retry description per failure domain
//! - **Delay calculation**: backoff curves with deterministic jitter and a
//!   wall-clock failure budget
//! - **Circuit breakers**: per-domain state shared by every concurrent call
//! - **The executor**: the attempt loop, driven by caller hooks and
//!   reporting through an injected metrics sink
//!
//! ## Components
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`PolicyEnvelope`] | Backoff shape, attempt cap, cool-down, budget |
//! | [`DelayCalculator`] | Pure mapping from attempt to delay |
//! | [`JitterSource`] | Deterministic seed per correlation id and attempt |
//! | [`CircuitBreakerRegistry`] | Closed/Open state per domain |
//! | [`RetryExecutor`] | Orchestrates one logical call |
//!
//! The envelope, delay, jitter and outcome types build with `foundation`
//! alone. The registry, executor, hooks and sinks need `runtime`.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use voxguard_common::resilience::{
//!     CircuitBreakerRegistry, FailureDecision, FnHooks, PolicyEnvelope, RetryContext,
//!     RetryExecutor,
//! };
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("token request failed: {0}")]
//! struct TokenError(String);
//!
//! # async fn request_token() -> Result<String, std::io::Error> { Ok(String::new()) }
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = RetryExecutor::new(Arc::new(CircuitBreakerRegistry::new()));
//! let hooks = FnHooks::new(
//!     |info: voxguard_common::resilience::FailureInfo<std::io::Error>| {
//!         FailureDecision::retry(TokenError(info.error.to_string()))
//!     },
//!     |state| TokenError(format!("{} breaker is {}", state.domain, state.state)),
//! );
//! let ctx = RetryContext::new("acquire_token", PolicyEnvelope::auth(), hooks);
//!
//! let token = executor.execute(request_token, &ctx).await?;
//! # let _ = token;
//! # Ok(())
//! # }
//! ```

// Pure data and algorithms, available with `foundation`
pub mod constants;
pub mod delay;
pub mod envelope;
pub mod error;
pub mod jitter;
pub mod outcome;

// Async execution, requires `runtime`
#[cfg(feature = "runtime")]
pub mod circuit_breaker;
#[cfg(feature = "runtime")]
pub mod clock;
#[cfg(feature = "runtime")]
pub mod context;
#[cfg(feature = "runtime")]
pub mod executor;
#[cfg(feature = "runtime")]
pub mod hooks;
#[cfg(feature = "runtime")]
pub mod metrics;
#[cfg(feature = "runtime")]
mod trace;

pub use delay::{
    base_delay_ms, calculate_delay, clamp_to_budget, preview_schedule, DelayCalculator, RetryPlan,
};
pub use envelope::{BackoffPolicy, JitterStrategy, PolicyEnvelope, PolicyEnvelopeBuilder};
pub use error::{ConfigError, ConfigResult, RetryError, RetryResult};
pub use jitter::{jitter_ms, jitter_seed, FixedJitter, HashJitter, JitterSource};
pub use outcome::{Outcome, OutcomeKind};

#[cfg(feature = "runtime")]
pub use circuit_breaker::{BreakerSnapshot, CircuitBreakerRegistry, CircuitState};
#[cfg(feature = "runtime")]
pub use clock::{Clock, SystemClock};
#[cfg(feature = "runtime")]
pub use context::RetryContext;
#[cfg(feature = "runtime")]
pub use executor::RetryExecutor;
#[cfg(feature = "runtime")]
pub use hooks::{FailureDecision, FailureInfo, FnHooks, RetryHooks};
#[cfg(feature = "runtime")]
pub use metrics::{
    CollectorMetricsSink, MetricMetadata, NoOpMetricsSink, RetryMetricsSink, METRIC_CIRCUIT_OPEN,
    METRIC_RETRY_ATTEMPTS, METRIC_RETRY_DELAY_MS, METRIC_RETRY_OUTCOMES,
};
