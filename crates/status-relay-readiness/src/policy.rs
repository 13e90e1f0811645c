//! Retry policy and backoff state machine shared by the readiness checkers.
//!
//! # State Machine
//!
//! ```text
//!            ┌───────────┐  success   ┌─────────┐
//!  start ───▶│  Probing  │───────────▶│  Ready  │
//!            └─────┬─────┘            └─────────┘
//!                  │ miss
//!                  ▼
//!        attempt + 1 > max_attempts? ── yes ──▶ ┌─────────┐
//!                  │ no                          │ Failed  │
//!                  ▼                             └─────────┘
//!            ┌───────────┐
//!            │  Backoff  │ sleep current_sleep, current_sleep *= multiplier
//!            └─────┬─────┘
//!                  └──────────▶ Probing
//! ```
//!
//! The bound is checked before sleeping, so a policy with `max_attempts = m`
//! issues exactly `m` probes and `m - 1` sleeps before failing.

use std::time::Duration;

use async_trait::async_trait;
use status_relay_core::{CoreError, RetryConfig};

/// Immutable retry parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_multiplier: f64,
    initial_sleep: Duration,
    max_sleep: Option<Duration>,
}

impl RetryPolicy {
    /// Create a new policy without a backoff cap.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_attempts` is zero or the multiplier is below
    /// one or not finite.
    pub fn new(
        max_attempts: u32,
        backoff_multiplier: f64,
        initial_sleep: Duration,
    ) -> status_relay_core::Result<Self> {
        if max_attempts == 0 {
            return Err(CoreError::invalid_config(
                "retry max attempts must be at least one",
            ));
        }
        if !backoff_multiplier.is_finite() || backoff_multiplier < 1.0 {
            return Err(CoreError::invalid_config(format!(
                "backoff multiplier must be a finite number >= 1, got {backoff_multiplier}"
            )));
        }
        Ok(Self {
            max_attempts,
            backoff_multiplier,
            initial_sleep,
            max_sleep: None,
        })
    }

    /// Cap every backoff sleep at `max_sleep`.
    #[must_use]
    pub fn with_max_sleep(mut self, max_sleep: Duration) -> Self {
        self.max_sleep = Some(max_sleep);
        self
    }

    /// Policy for the readiness polling loops: seeded by `sleep_time_ms`, uncapped.
    ///
    /// # Errors
    ///
    /// Returns an error if the retry configuration is invalid.
    pub fn verification(config: &RetryConfig) -> status_relay_core::Result<Self> {
        Self::new(
            config.max_attempts,
            config.multiplier,
            Duration::from_millis(config.sleep_time_ms),
        )
    }

    /// Policy for the topic creation request: seeded by `initial_interval_ms`,
    /// capped at `max_interval_ms`.
    ///
    /// # Errors
    ///
    /// Returns an error if the retry configuration is invalid.
    pub fn creation_request(config: &RetryConfig) -> status_relay_core::Result<Self> {
        Ok(Self::new(
            config.max_attempts,
            config.multiplier,
            Duration::from_millis(config.initial_interval_ms),
        )?
        .with_max_sleep(Duration::from_millis(config.max_interval_ms)))
    }

    /// Maximum number of probes per loop.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Factor applied to the sleep after every miss.
    #[must_use]
    pub const fn backoff_multiplier(&self) -> f64 {
        self.backoff_multiplier
    }

    /// Sleep after the first miss.
    #[must_use]
    pub const fn initial_sleep(&self) -> Duration {
        self.initial_sleep
    }

    /// Optional upper bound on a single sleep.
    #[must_use]
    pub const fn max_sleep(&self) -> Option<Duration> {
        self.max_sleep
    }

    /// The sleep that follows the miss on attempt `n` (1-based):
    /// `initial_sleep × multiplier^(n-1)`, capped at `max_sleep`.
    #[must_use]
    pub fn sleep_for_attempt(&self, attempt: u32) -> Duration {
        let mut sleep = self.initial_sleep;
        for _ in 1..attempt {
            sleep = scale(sleep, self.backoff_multiplier, self.max_sleep);
        }
        cap(sleep, self.max_sleep)
    }

    /// Start a fresh backoff for one loop invocation.
    #[must_use]
    pub fn backoff(&self) -> BackoffState {
        BackoffState {
            attempt: 1,
            current_sleep: cap(self.initial_sleep, self.max_sleep),
            max_attempts: self.max_attempts,
            multiplier: self.backoff_multiplier,
            max_sleep: self.max_sleep,
        }
    }
}

/// Mutable backoff state owned by a single loop invocation.
#[derive(Debug, Clone)]
pub struct BackoffState {
    attempt: u32,
    current_sleep: Duration,
    max_attempts: u32,
    multiplier: f64,
    max_sleep: Option<Duration>,
}

impl BackoffState {
    /// The probe currently being issued (1-based).
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    /// The sleep that will follow a miss on the current attempt.
    #[must_use]
    pub const fn current_sleep(&self) -> Duration {
        self.current_sleep
    }

    /// Record a miss on the current attempt.
    ///
    /// Returns the sleep to wait before the next probe, or `None` when the
    /// attempt budget is spent. The attempt counter never exceeds
    /// `max_attempts`.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempt.saturating_add(1) > self.max_attempts {
            return None;
        }
        self.attempt += 1;
        let delay = self.current_sleep;
        self.current_sleep = scale(self.current_sleep, self.multiplier, self.max_sleep);
        Some(delay)
    }
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn scale(sleep: Duration, multiplier: f64, max_sleep: Option<Duration>) -> Duration {
    let nanos = (sleep.as_nanos() as f64 * multiplier).round();
    let next = if nanos >= u64::MAX as f64 {
        Duration::from_nanos(u64::MAX)
    } else {
        Duration::from_nanos(nanos as u64)
    };
    cap(next, max_sleep)
}

fn cap(sleep: Duration, max_sleep: Option<Duration>) -> Duration {
    match max_sleep {
        Some(max) => sleep.min(max),
        None => sleep,
    }
}

/// Waits between probes.
///
/// Injected so tests can record the backoff series instead of sleeping.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Wait for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// A [`Sleeper`] backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// A sleeper that records requested sleeps and returns immediately.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;
    use parking_lot::Mutex;

    /// Records every requested sleep.
    #[derive(Debug, Default)]
    pub struct RecordingSleeper {
        sleeps: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        /// Create a new recording sleeper.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// All sleeps requested so far, in order.
        #[must_use]
        pub fn sleeps(&self) -> Vec<Duration> {
            self.sleeps.lock().clone()
        }

        /// Sum of all sleeps requested so far.
        #[must_use]
        pub fn total(&self) -> Duration {
            self.sleeps.lock().iter().sum()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().push(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(RetryPolicy::new(0, 2.0, ms(100)).is_err());
        assert!(RetryPolicy::new(3, 0.9, ms(100)).is_err());
        assert!(RetryPolicy::new(3, f64::INFINITY, ms(100)).is_err());
        assert!(RetryPolicy::new(1, 1.0, ms(0)).is_ok());
    }

    #[test]
    fn always_missing_loop_yields_max_attempts_minus_one_sleeps() {
        let policy = RetryPolicy::new(4, 3.0, ms(10)).unwrap();
        let mut backoff = policy.backoff();

        let mut delays = Vec::new();
        while let Some(delay) = backoff.next_delay() {
            delays.push(delay);
        }

        assert_eq!(delays, vec![ms(10), ms(30), ms(90)]);
        assert_eq!(backoff.attempt(), 4);
        // Budget stays spent.
        assert!(backoff.next_delay().is_none());
        assert_eq!(backoff.attempt(), 4);
    }

    #[test]
    fn current_sleep_follows_geometric_series() {
        let policy = RetryPolicy::new(6, 2.0, ms(100)).unwrap();
        let mut backoff = policy.backoff();
        for n in 1..=6 {
            assert_eq!(backoff.attempt(), n);
            assert_eq!(backoff.current_sleep(), policy.sleep_for_attempt(n));
            assert_eq!(backoff.current_sleep(), ms(100 * 2u64.pow(n - 1)));
            backoff.next_delay();
        }
    }

    #[test]
    fn single_attempt_never_sleeps() {
        let policy = RetryPolicy::new(1, 2.0, ms(100)).unwrap();
        let mut backoff = policy.backoff();
        assert!(backoff.next_delay().is_none());
        assert_eq!(backoff.attempt(), 1);
    }

    #[test]
    fn unit_multiplier_keeps_sleep_constant() {
        let policy = RetryPolicy::new(3, 1.0, ms(250)).unwrap();
        let mut backoff = policy.backoff();
        assert_eq!(backoff.next_delay(), Some(ms(250)));
        assert_eq!(backoff.next_delay(), Some(ms(250)));
        assert_eq!(backoff.next_delay(), None);
    }

    #[test]
    fn cap_bounds_sleep() {
        let policy = RetryPolicy::new(5, 10.0, ms(100))
            .unwrap()
            .with_max_sleep(ms(1500));
        let mut backoff = policy.backoff();
        assert_eq!(backoff.next_delay(), Some(ms(100)));
        assert_eq!(backoff.next_delay(), Some(ms(1000)));
        assert_eq!(backoff.next_delay(), Some(ms(1500)));
        assert_eq!(backoff.next_delay(), Some(ms(1500)));
        assert_eq!(backoff.next_delay(), None);
    }

    #[test]
    fn huge_series_saturates() {
        let policy = RetryPolicy::new(u32::MAX, 1000.0, Duration::from_secs(3600)).unwrap();
        let sleep = policy.sleep_for_attempt(20);
        assert_eq!(sleep, Duration::from_nanos(u64::MAX));
    }

    #[test]
    fn policies_from_config() {
        let config = RetryConfig::default();

        let verification = RetryPolicy::verification(&config).unwrap();
        assert_eq!(verification.initial_sleep(), ms(2000));
        assert_eq!(verification.max_sleep(), None);
        assert_eq!(verification.max_attempts(), 3);

        let request = RetryPolicy::creation_request(&config).unwrap();
        assert_eq!(request.initial_sleep(), ms(1000));
        assert_eq!(request.max_sleep(), Some(ms(10_000)));
    }

    #[tokio::test]
    async fn recording_sleeper_records_in_order() {
        let sleeper = mock::RecordingSleeper::new();
        sleeper.sleep(ms(5)).await;
        sleeper.sleep(ms(7)).await;
        assert_eq!(sleeper.sleeps(), vec![ms(5), ms(7)]);
        assert_eq!(sleeper.total(), ms(12));
    }
}
