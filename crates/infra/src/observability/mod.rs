//! Observability infrastructure for logging and retry metrics
//!
//! - [`logging`]: installs the process-wide `tracing` subscriber
//! - [`retry_metrics`]: Prometheus implementation of the retry executor's
//!   metrics sink

pub mod logging;
pub mod retry_metrics;

pub use logging::{init, init_from_env, LogFormat};
pub use retry_metrics::PrometheusMetricsSink;
