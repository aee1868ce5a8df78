//! Virtual time for deterministic retry tests
//!
//! [`MockClock`] implements [`Clock`] without touching the real timer:
//! `wait` advances the virtual elapsed time, records the requested duration,
//! and resolves after a single cooperative yield.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use voxguard_common::resilience::Clock;
//! use voxguard_common::testing::MockClock;
//!
//! let mock = MockClock::new();
//! let start = mock.now();
//! mock.advance(Duration::from_secs(5));
//! assert_eq!(mock.now().duration_since(start), Duration::from_secs(5));
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::resilience::Clock;

#[derive(Debug, Default)]
struct MockClockState {
    elapsed: Duration,
    waits: Vec<Duration>,
}

/// Mock clock for deterministic testing
///
/// Cloned clocks share the same virtual time and wait log.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    base_system_time: SystemTime,
    state: Arc<Mutex<MockClockState>>,
}

impl MockClock {
    /// Create a new mock clock anchored at the current real time
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            base_system_time: SystemTime::now(),
            state: Arc::new(Mutex::new(MockClockState::default())),
        }
    }

    /// Advance the mock clock by a duration
    ///
    /// Simulates time passing (for example inside an operation) without
    /// recording a wait.
    pub fn advance(&self, duration: Duration) {
        self.state.lock().elapsed += duration;
    }

    /// Set the mock clock to a specific elapsed time
    pub fn set_elapsed(&self, duration: Duration) {
        self.state.lock().elapsed = duration;
    }

    /// Get the current elapsed time
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.state.lock().elapsed
    }

    /// Every duration passed to [`Clock::wait`], in call order
    #[must_use]
    pub fn waits(&self) -> Vec<Duration> {
        self.state.lock().waits.clone()
    }

    /// Sum of all recorded waits
    #[must_use]
    pub fn total_waited(&self) -> Duration {
        self.state.lock().waits.iter().sum()
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }

    fn system_time(&self) -> SystemTime {
        self.base_system_time + self.elapsed()
    }

    async fn wait(&self, duration: Duration) {
        {
            let mut state = self.state.lock();
            state.elapsed += duration;
            state.waits.push(duration);
        }
        tokio::task::yield_now().await;
    }
}
