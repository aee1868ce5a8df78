//! Per-domain circuit breaker registry
//!
//! Every logical call against a domain shares that domain's breaker. A
//! breaker is created lazily on the first failure event, trips to `Open`
//! when the executor decides the domain is unhealthy, and re-closes on the
//! first check made after its cool-down has elapsed. There is no half-open
//! probe state.
//!
//! Entries live in a [`DashMap`]; each mutation runs under the entry lock
//! for its domain, so concurrent calls against the same domain observe a
//! single consistent counter and state.
//!
//! The registry is owned explicitly and shared through `Arc`:
//!
//! ```
//! use std::sync::Arc;
//! use std::time::{Duration, Instant};
//!
//! use voxguard_common::resilience::{CircuitBreakerRegistry, CircuitState};
//!
//! let registry = Arc::new(CircuitBreakerRegistry::new());
//! let now = Instant::now();
//! registry.trip("auth", now, Duration::from_secs(60));
//!
//! assert!(registry.is_open("auth", now));
//! assert_eq!(registry.state("auth").state, CircuitState::Open);
//! assert!(!registry.is_open("auth", now + Duration::from_secs(61)));
//! ```

use std::fmt;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CircuitState {
    /// Calls are allowed
    #[default]
    Closed,
    /// Calls are rejected until the cool-down elapses
    Open,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "CLOSED"),
            CircuitState::Open => write!(f, "OPEN"),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct BreakerEntry {
    state: CircuitState,
    opened_at: Option<Instant>,
    cool_down: Duration,
    consecutive_failures: u32,
}

impl BreakerEntry {
    fn reset_at(&self) -> Option<Instant> {
        self.opened_at.map(|opened| opened + self.cool_down)
    }

    fn close(&mut self) {
        self.state = CircuitState::Closed;
        self.opened_at = None;
        self.consecutive_failures = 0;
    }
}

/// Point-in-time view of one domain's breaker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakerSnapshot {
    pub domain: String,
    pub state: CircuitState,
    pub opened_at: Option<Instant>,
    pub cool_down: Duration,
    pub consecutive_failures: u32,
}

impl BreakerSnapshot {
    fn closed(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            state: CircuitState::Closed,
            opened_at: None,
            cool_down: Duration::ZERO,
            consecutive_failures: 0,
        }
    }

    fn from_entry(domain: &str, entry: &BreakerEntry) -> Self {
        Self {
            domain: domain.to_string(),
            state: entry.state,
            opened_at: entry.opened_at,
            cool_down: entry.cool_down,
            consecutive_failures: entry.consecutive_failures,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == CircuitState::Open
    }

    /// Instant at which an open breaker will re-close on the next check
    pub fn reset_at(&self) -> Option<Instant> {
        self.opened_at.map(|opened| opened + self.cool_down)
    }

    /// Time left until `reset_at`, measured from `now`
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.reset_at().map(|reset| reset.saturating_duration_since(now))
    }
}

/// Registry of circuit breakers keyed by domain
#[derive(Debug, Default)]
pub struct CircuitBreakerRegistry {
    breakers: DashMap<String, BreakerEntry>,
}

impl CircuitBreakerRegistry {
    pub fn new() -> Self {
        Self { breakers: DashMap::new() }
    }

    /// Open the breaker for `domain` until `now + cool_down`
    pub fn trip(&self, domain: &str, now: Instant, cool_down: Duration) -> BreakerSnapshot {
        let mut entry = self.breakers.entry(domain.to_string()).or_default();
        if entry.state != CircuitState::Open {
            warn!(
                domain = domain,
                consecutive_failures = entry.consecutive_failures,
                cool_down_ms = cool_down.as_millis() as u64,
                "Circuit breaker opened"
            );
        }
        entry.state = CircuitState::Open;
        entry.opened_at = Some(now);
        entry.cool_down = cool_down;
        BreakerSnapshot::from_entry(domain, &entry)
    }

    /// Whether calls against `domain` must fail fast at `now`
    ///
    /// An open breaker whose cool-down has elapsed is closed here and its
    /// failure counter cleared.
    pub fn is_open(&self, domain: &str, now: Instant) -> bool {
        self.open_snapshot(domain, now).is_some()
    }

    /// Snapshot of `domain` if its breaker is open at `now`
    ///
    /// The state check and the snapshot are taken under one entry lock, so
    /// the snapshot always reports `Open`.
    pub fn open_snapshot(&self, domain: &str, now: Instant) -> Option<BreakerSnapshot> {
        let mut entry = self.breakers.get_mut(domain)?;

        if entry.state != CircuitState::Open {
            return None;
        }

        match entry.reset_at() {
            Some(reset_at) if now >= reset_at => {
                entry.close();
                info!(domain = domain, "Circuit breaker closed after cool-down");
                None
            }
            _ => Some(BreakerSnapshot::from_entry(domain, &entry)),
        }
    }

    /// Current state of `domain`; unknown domains report closed
    pub fn state(&self, domain: &str) -> BreakerSnapshot {
        self.breakers
            .get(domain)
            .map(|entry| BreakerSnapshot::from_entry(domain, &entry))
            .unwrap_or_else(|| BreakerSnapshot::closed(domain))
    }

    /// Count a failed attempt and return the new consecutive-failure count
    pub fn record_failure(&self, domain: &str) -> u32 {
        let mut entry = self.breakers.entry(domain.to_string()).or_default();
        entry.consecutive_failures = entry.consecutive_failures.saturating_add(1);
        debug!(
            domain = domain,
            consecutive_failures = entry.consecutive_failures,
            "Recorded failure"
        );
        entry.consecutive_failures
    }

    /// Clear the consecutive-failure count after a success
    pub fn record_success(&self, domain: &str) {
        if let Some(mut entry) = self.breakers.get_mut(domain) {
            entry.consecutive_failures = 0;
        }
    }

    /// Forget all state for `domain`
    pub fn reset(&self, domain: &str) -> bool {
        let removed = self.breakers.remove(domain).is_some();
        if removed {
            info!(domain = domain, "Circuit breaker reset");
        }
        removed
    }

    /// Every domain with breaker state, sorted
    pub fn domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = self.breakers.iter().map(|e| e.key().clone()).collect();
        domains.sort();
        domains
    }

    /// Snapshot of every known domain, sorted by domain
    pub fn snapshot_all(&self) -> Vec<BreakerSnapshot> {
        let mut snapshots: Vec<BreakerSnapshot> = self
            .breakers
            .iter()
            .map(|entry| BreakerSnapshot::from_entry(entry.key(), entry.value()))
            .collect();
        snapshots.sort_by(|a, b| a.domain.cmp(&b.domain));
        snapshots
    }
}
