//! Deterministic jitter keyed by correlation id and attempt number
//!
//! The same `(correlation_id, attempt)` pair always yields the same seed, so
//! retry timing is reproducible in tests and in incident replays. The hash is
//! not cryptographic.

use std::fmt::Debug;

use super::constants::JITTER_HASH_DIVISOR;
use super::envelope::JitterStrategy;

/// Source of jitter seeds in `[0, 1]`
pub trait JitterSource: Send + Sync + Debug {
    /// Seed for the given call and attempt
    fn seed(&self, correlation_id: &str, attempt: u32) -> f64;
}

/// Rolling 32-bit hash over the UTF-16 units of `"<correlation_id>:<attempt>"`
#[derive(Debug, Clone, Copy, Default)]
pub struct HashJitter;

impl JitterSource for HashJitter {
    fn seed(&self, correlation_id: &str, attempt: u32) -> f64 {
        jitter_seed(correlation_id, attempt)
    }
}

/// Always returns the same seed; clamped into `[0, 1]`
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter(pub f64);

impl JitterSource for FixedJitter {
    fn seed(&self, _correlation_id: &str, _attempt: u32) -> f64 {
        self.0.clamp(0.0, 1.0)
    }
}

/// Compute the deterministic seed for a call and attempt
pub fn jitter_seed(correlation_id: &str, attempt: u32) -> f64 {
    let key = format!("{}:{}", correlation_id, attempt);
    let hash = key
        .encode_utf16()
        .fold(0u32, |h, unit| h.wrapping_mul(31).wrapping_add(u32::from(unit)));
    f64::from(hash) / JITTER_HASH_DIVISOR
}

/// Jitter in milliseconds to add to `base_ms`
///
/// `DeterministicEqual` can be negative; the caller clamps the sum at zero.
pub fn jitter_ms(strategy: JitterStrategy, base_ms: f64, seed: f64) -> f64 {
    match strategy {
        JitterStrategy::None => 0.0,
        JitterStrategy::DeterministicFull => base_ms * seed,
        JitterStrategy::DeterministicEqual => base_ms * 0.5 * (2.0 * seed - 1.0),
    }
}
