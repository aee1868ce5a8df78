//! # VoxGuard Infrastructure
//!
//! Process-level plumbing around the retry executor in `voxguard-common`.
//!
//! This crate contains:
//! - Policy envelope configuration loading (TOML/JSON files, `.env`,
//!   environment overrides)
//! - `tracing` subscriber initialization
//! - A Prometheus-backed retry metrics sink
//!
//! ## Architecture
//! - Implements traits defined in `voxguard-common`
//! - Contains the "impure" code (file system, environment, global
//!   subscriber, metric registries)

pub mod config;
pub mod errors;
pub mod observability;

// Re-export commonly used items
pub use config::{load, load_from_file, ResilienceConfig};
pub use errors::{InfraError, InfraResult};
pub use observability::{LogFormat, PrometheusMetricsSink};
