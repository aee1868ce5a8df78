//! Time abstraction used by the retry executor
//!
//! The executor never reads the wall clock or sleeps directly. It asks a
//! [`Clock`] for the current instant and awaits [`Clock::wait`] between
//! attempts, so tests can substitute
//! [`MockClock`](crate::testing::MockClock) and run without real time
//! passing.
//!
//! # Examples
//!
//! ```
//! use voxguard_common::resilience::{Clock, SystemClock};
//!
//! let clock = SystemClock;
//! let start = clock.now();
//! assert!(clock.now() >= start);
//! ```

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

/// Trait for time operations to enable testing
#[async_trait]
pub trait Clock: Send + Sync {
    /// Get current instant (monotonic time)
    fn now(&self) -> Instant;

    /// Get current system time (wall clock)
    fn system_time(&self) -> SystemTime;

    /// Suspend the caller for `duration`
    ///
    /// This is the only suspension point the executor introduces between
    /// attempts.
    async fn wait(&self, duration: Duration);

    /// Get milliseconds since UNIX epoch
    fn millis_since_epoch(&self) -> u64 {
        self.system_time().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
    }
}

/// Real system clock implementation backed by tokio's timer
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }

    async fn wait(&self, duration: Duration) {
        if duration.is_zero() {
            tokio::task::yield_now().await;
            return;
        }
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for resilience::clock.
    use super::*;

    /// Validates the system clock scenario.
    ///
    /// Assertions:
    /// - Ensures `now2 >= now1` evaluates to true.
    #[test]
    fn test_system_clock_monotonic() {
        let clock = SystemClock;
        let now1 = clock.now();
        let now2 = clock.now();

        assert!(now2 >= now1);
        assert!(clock.millis_since_epoch() > 0);
    }

    /// Validates `SystemClock::wait` against tokio's paused clock.
    ///
    /// Assertions:
    /// - Confirms the virtual tokio clock advanced by the requested duration.
    #[tokio::test(start_paused = true)]
    async fn test_system_clock_wait_uses_tokio_timer() {
        let clock = SystemClock;
        let before = tokio::time::Instant::now();

        clock.wait(Duration::from_millis(250)).await;

        assert!(tokio::time::Instant::now() - before >= Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_system_clock_zero_wait_returns() {
        SystemClock.wait(Duration::ZERO).await;
    }
}
