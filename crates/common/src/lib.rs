//! Shared building blocks for voxguard's network-facing call paths.
//!
//! The centerpiece is [`resilience`]: a retry and circuit-breaker executor
//! that wraps fallible async operations (token acquisition, transport
//! negotiation, session renewal) with per-domain policy envelopes,
//! deterministic jittered backoff and a shared breaker registry.
//!
//! # Feature Tiers
//!
//! - `foundation`: errors, serde helpers and the pure parts of
//!   [`resilience`] (envelopes, delay calculation, jitter, outcomes), no
//!   async runtime
//! - `runtime` (default): the breaker registry and executor, observability
//!   traits and test utilities

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;
#[cfg(feature = "foundation")]
pub mod resilience;
#[cfg(feature = "foundation")]
pub mod utils;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod observability;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use error::{CommonError, ErrorClassification, ErrorSeverity};
#[cfg(feature = "foundation")]
pub use resilience::{
    BackoffPolicy, JitterStrategy, Outcome, OutcomeKind, PolicyEnvelope, RetryError, RetryPlan,
    RetryResult,
};
#[cfg(feature = "runtime")]
pub use resilience::{
    CircuitBreakerRegistry, CircuitState, Clock, FailureDecision, FailureInfo, RetryContext,
    RetryExecutor, RetryHooks, RetryMetricsSink, SystemClock,
};
#[cfg(feature = "foundation")]
pub use utils::serde::duration_millis;
