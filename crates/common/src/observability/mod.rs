//! Observability primitives
//!
//! Trait abstractions that let components emit metrics without binding to a
//! backend. Concrete exporters (Prometheus) live in `voxguard-infra`.

pub mod traits;

pub use traits::{MetricsCollector, NoOpMetricsCollector};
