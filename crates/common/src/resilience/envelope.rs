//! Policy envelopes: the static retry description of one failure domain
//!
//! An envelope is immutable once built. It carries the backoff shape, the
//! jitter strategy, the attempt cap, the breaker cool-down and the failure
//! budget for a domain such as `auth` or `transport`. Envelopes are
//! validated on construction through [`PolicyEnvelopeBuilder`] and again by
//! the executor before the first attempt.
//!
//! # Examples
//!
//! ```
//! use voxguard_common::resilience::{BackoffPolicy, JitterStrategy, PolicyEnvelope};
//!
//! let envelope = PolicyEnvelope::builder("transport")
//!     .policy(BackoffPolicy::Exponential)
//!     .initial_delay_ms(200)
//!     .multiplier(2.0)
//!     .max_delay_ms(5_000)
//!     .max_attempts(5)
//!     .jitter_strategy(JitterStrategy::DeterministicFull)
//!     .failure_budget_ms(120_000)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(envelope.domain, "transport");
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::constants::{
    DEFAULT_CONSECUTIVE_FAILURE_THRESHOLD, DEFAULT_COOL_DOWN_MS, DEFAULT_FAILURE_BUDGET_MS,
    DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY_MS, DEFAULT_MULTIPLIER,
    DOMAIN_AUTH, DOMAIN_SESSION, DOMAIN_TRANSPORT, MAX_MAX_ATTEMPTS, MIN_MAX_ATTEMPTS,
};
use super::error::{ConfigError, ConfigResult};

/// Shape of the delay curve between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackoffPolicy {
    /// Never wait
    None,
    /// Retry without waiting
    Immediate,
    /// `initial + (attempt - 1) * multiplier`
    Linear,
    /// No wait after the first failure, then exponential from `initial`
    Hybrid,
    /// `initial * multiplier^(attempt - 1)`
    #[default]
    Exponential,
}

impl BackoffPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Immediate => "immediate",
            Self::Linear => "linear",
            Self::Hybrid => "hybrid",
            Self::Exponential => "exponential",
        }
    }

    /// Policies that never wait between attempts
    pub fn is_zero_delay(&self) -> bool {
        matches!(self, Self::None | Self::Immediate)
    }

    /// Parse a policy name; unrecognized names fall back to exponential
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "none" => Self::None,
            "immediate" => Self::Immediate,
            "linear" => Self::Linear,
            "hybrid" => Self::Hybrid,
            _ => Self::Exponential,
        }
    }
}

impl fmt::Display for BackoffPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackoffPolicy {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl Serialize for BackoffPolicy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BackoffPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_name(&name))
    }
}

/// Jitter applied on top of the base delay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JitterStrategy {
    /// No jitter
    #[default]
    None,
    /// `base * seed`, always non-negative
    DeterministicFull,
    /// `base * 0.5 * (2 * seed - 1)`, centred on zero
    DeterministicEqual,
}

impl JitterStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::DeterministicFull => "deterministic-full",
            Self::DeterministicEqual => "deterministic-equal",
        }
    }
}

impl fmt::Display for JitterStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JitterStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "deterministic-full" | "full" => Ok(Self::DeterministicFull),
            "deterministic-equal" | "equal" => Ok(Self::DeterministicEqual),
            other => Err(ConfigError::Invalid {
                message: format!("unknown jitter strategy '{}'", other),
            }),
        }
    }
}

mod defaults {
    use super::*;

    pub fn initial_delay_ms() -> u64 {
        DEFAULT_INITIAL_DELAY_MS
    }

    pub fn multiplier() -> f64 {
        DEFAULT_MULTIPLIER
    }

    pub fn max_delay_ms() -> u64 {
        DEFAULT_MAX_DELAY_MS
    }

    pub fn max_attempts() -> u32 {
        DEFAULT_MAX_ATTEMPTS
    }

    pub fn cool_down_ms() -> u64 {
        DEFAULT_COOL_DOWN_MS
    }

    pub fn failure_budget_ms() -> u64 {
        DEFAULT_FAILURE_BUDGET_MS
    }

    pub fn consecutive_failure_threshold() -> Option<u32> {
        Some(DEFAULT_CONSECUTIVE_FAILURE_THRESHOLD)
    }
}

/// Static retry behavior for one failure domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyEnvelope {
    /// Key for circuit breaker state and metrics
    pub domain: String,
    #[serde(default)]
    pub policy: BackoffPolicy,
    #[serde(default = "defaults::initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "defaults::multiplier")]
    pub multiplier: f64,
    #[serde(default = "defaults::max_delay_ms")]
    pub max_delay_ms: u64,
    /// Upper bound on attempts for one logical call
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,
    #[serde(default)]
    pub jitter_strategy: JitterStrategy,
    /// How long a tripped breaker stays open
    #[serde(default = "defaults::cool_down_ms")]
    pub cool_down_ms: u64,
    /// Wall-clock limit for one logical call
    #[serde(default = "defaults::failure_budget_ms")]
    pub failure_budget_ms: u64,
    /// Consecutive failed attempts, counted per domain across calls, that
    /// trip the breaker. `None` leaves tripping to terminal failures only.
    #[serde(default = "defaults::consecutive_failure_threshold")]
    pub consecutive_failure_threshold: Option<u32>,
}

impl PolicyEnvelope {
    /// Start building an envelope for `domain` from the default shape
    pub fn builder(domain: impl Into<String>) -> PolicyEnvelopeBuilder {
        PolicyEnvelopeBuilder::new(domain)
    }

    /// Default-shaped envelope for `domain`, not validated
    pub fn with_defaults(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            policy: BackoffPolicy::default(),
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            multiplier: DEFAULT_MULTIPLIER,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            jitter_strategy: JitterStrategy::default(),
            cool_down_ms: DEFAULT_COOL_DOWN_MS,
            failure_budget_ms: DEFAULT_FAILURE_BUDGET_MS,
            consecutive_failure_threshold: Some(DEFAULT_CONSECUTIVE_FAILURE_THRESHOLD),
        }
    }

    /// Azure authentication calls: slow exponential growth, long cool-down
    pub fn auth() -> Self {
        Self {
            domain: DOMAIN_AUTH.to_string(),
            policy: BackoffPolicy::Exponential,
            initial_delay_ms: 500,
            multiplier: 2.0,
            max_delay_ms: 8_000,
            max_attempts: 4,
            jitter_strategy: JitterStrategy::DeterministicEqual,
            cool_down_ms: 60_000,
            failure_budget_ms: 30_000,
            consecutive_failure_threshold: Some(DEFAULT_CONSECUTIVE_FAILURE_THRESHOLD),
        }
    }

    /// Realtime transport negotiation
    pub fn transport() -> Self {
        Self {
            domain: DOMAIN_TRANSPORT.to_string(),
            policy: BackoffPolicy::Exponential,
            initial_delay_ms: 200,
            multiplier: 2.0,
            max_delay_ms: 5_000,
            max_attempts: 5,
            jitter_strategy: JitterStrategy::DeterministicFull,
            cool_down_ms: 30_000,
            failure_budget_ms: 120_000,
            consecutive_failure_threshold: Some(5),
        }
    }

    /// Session renewal: first retry is immediate
    pub fn session() -> Self {
        Self {
            domain: DOMAIN_SESSION.to_string(),
            policy: BackoffPolicy::Hybrid,
            initial_delay_ms: 250,
            multiplier: 2.0,
            max_delay_ms: 4_000,
            max_attempts: 3,
            jitter_strategy: JitterStrategy::DeterministicFull,
            cool_down_ms: 15_000,
            failure_budget_ms: 20_000,
            consecutive_failure_threshold: Some(DEFAULT_CONSECUTIVE_FAILURE_THRESHOLD),
        }
    }

    /// Built-in preset for a known domain name
    pub fn preset(domain: &str) -> Option<Self> {
        match domain {
            DOMAIN_AUTH => Some(Self::auth()),
            DOMAIN_TRANSPORT => Some(Self::transport()),
            DOMAIN_SESSION => Some(Self::session()),
            _ => None,
        }
    }

    /// Every built-in preset
    pub fn presets() -> Vec<Self> {
        vec![Self::auth(), Self::transport(), Self::session()]
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn cool_down(&self) -> Duration {
        Duration::from_millis(self.cool_down_ms)
    }

    pub fn failure_budget(&self) -> Duration {
        Duration::from_millis(self.failure_budget_ms)
    }

    /// Validate the envelope
    pub fn validate(&self) -> ConfigResult<()> {
        if self.domain.trim().is_empty() {
            return Err(ConfigError::Invalid { message: "domain must not be empty".to_string() });
        }

        if self.max_attempts < MIN_MAX_ATTEMPTS {
            return Err(ConfigError::field(
                &self.domain,
                "max_attempts",
                format!("must be at least {}", MIN_MAX_ATTEMPTS),
            ));
        }

        if self.max_attempts > MAX_MAX_ATTEMPTS {
            return Err(ConfigError::field(
                &self.domain,
                "max_attempts",
                format!("must be at most {}", MAX_MAX_ATTEMPTS),
            ));
        }

        if !self.multiplier.is_finite() || self.multiplier < 0.0 {
            return Err(ConfigError::field(
                &self.domain,
                "multiplier",
                "must be a finite, non-negative number",
            ));
        }

        if !self.policy.is_zero_delay() && self.initial_delay_ms > self.max_delay_ms {
            return Err(ConfigError::field(
                &self.domain,
                "initial_delay_ms",
                format!(
                    "({}) must not exceed max_delay_ms ({})",
                    self.initial_delay_ms, self.max_delay_ms
                ),
            ));
        }

        if self.consecutive_failure_threshold == Some(0) {
            return Err(ConfigError::field(
                &self.domain,
                "consecutive_failure_threshold",
                "must be greater than 0 when set",
            ));
        }

        Ok(())
    }
}

/// Builder for [`PolicyEnvelope`]
#[derive(Debug, Clone)]
pub struct PolicyEnvelopeBuilder {
    envelope: PolicyEnvelope,
}

impl PolicyEnvelopeBuilder {
    pub fn new(domain: impl Into<String>) -> Self {
        Self { envelope: PolicyEnvelope::with_defaults(domain) }
    }

    /// Start from an existing envelope, typically a preset
    pub fn from_envelope(envelope: PolicyEnvelope) -> Self {
        Self { envelope }
    }

    pub fn policy(mut self, policy: BackoffPolicy) -> Self {
        self.envelope.policy = policy;
        self
    }

    pub fn initial_delay_ms(mut self, ms: u64) -> Self {
        self.envelope.initial_delay_ms = ms;
        self
    }

    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.envelope.multiplier = multiplier;
        self
    }

    pub fn max_delay_ms(mut self, ms: u64) -> Self {
        self.envelope.max_delay_ms = ms;
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.envelope.max_attempts = attempts;
        self
    }

    pub fn jitter_strategy(mut self, strategy: JitterStrategy) -> Self {
        self.envelope.jitter_strategy = strategy;
        self
    }

    pub fn cool_down_ms(mut self, ms: u64) -> Self {
        self.envelope.cool_down_ms = ms;
        self
    }

    pub fn failure_budget_ms(mut self, ms: u64) -> Self {
        self.envelope.failure_budget_ms = ms;
        self
    }

    pub fn consecutive_failure_threshold(mut self, threshold: Option<u32>) -> Self {
        self.envelope.consecutive_failure_threshold = threshold;
        self
    }

    /// Build and validate the envelope
    pub fn build(self) -> ConfigResult<PolicyEnvelope> {
        self.envelope.validate()?;
        Ok(self.envelope)
    }
}
