// Constants for the resilience module

/// Default backoff seed delay in milliseconds
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 200;

/// Default backoff multiplier
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

/// Default delay cap in milliseconds
pub const DEFAULT_MAX_DELAY_MS: u64 = 5_000;

/// Default maximum number of attempts for one logical call
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default time a tripped breaker stays open
pub const DEFAULT_COOL_DOWN_MS: u64 = 30_000;

/// Default wall-clock budget for one logical call
pub const DEFAULT_FAILURE_BUDGET_MS: u64 = 60_000;

/// Default consecutive failures, per domain, that trip the breaker
pub const DEFAULT_CONSECUTIVE_FAILURE_THRESHOLD: u32 = 3;

/// Minimum allowed max_attempts value
pub const MIN_MAX_ATTEMPTS: u32 = 1;

/// Maximum allowed max_attempts value
pub const MAX_MAX_ATTEMPTS: u32 = 100;

/// Divisor normalizing the 32-bit jitter hash into `[0, 1]`
pub const JITTER_HASH_DIVISOR: f64 = 0xFFFF_FFFF_u32 as f64;

/// Built-in domain names with presets
pub const DOMAIN_AUTH: &str = "auth";
pub const DOMAIN_TRANSPORT: &str = "transport";
pub const DOMAIN_SESSION: &str = "session";
