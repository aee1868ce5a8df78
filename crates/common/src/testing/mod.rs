//! Testing utilities and helpers
//!
//! - **[`time`]**: [`MockClock`], a virtual clock whose waits resolve
//!   immediately and are recorded
//! - **[`metrics`]**: [`RecordingMetricsSink`], capturing retry telemetry
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use voxguard_common::resilience::{PolicyEnvelope, RetryContext};
//! use voxguard_common::testing::{MockClock, RecordingMetricsSink};
//!
//! let clock = MockClock::new();
//! let sink = Arc::new(RecordingMetricsSink::new());
//! let ctx = RetryContext::new("renew", PolicyEnvelope::session(), ())
//!     .with_clock(Arc::new(clock.clone()))
//!     .with_metrics(sink.clone());
//! # let _ = ctx;
//! ```

pub mod metrics;
pub mod time;

pub use metrics::{AttemptEvent, RecordingMetricsSink};
pub use time::MockClock;
