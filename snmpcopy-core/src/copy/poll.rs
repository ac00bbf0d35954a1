//! Polling policy and the sleep abstraction behind it.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// How often and how long to poll `ccCopyState`.
///
/// The default is 300 polls, 100 ms apart, with no backoff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollPolicy {
    pub max_attempts: u32,
    #[serde(rename = "interval_ms", with = "millis")]
    pub interval: Duration,
    /// Multiplier applied to the interval after each non-terminal poll.
    pub backoff: f64,
    #[serde(rename = "max_interval_ms", with = "millis")]
    pub max_interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 300,
            interval: Duration::from_millis(100),
            backoff: 1.0,
            max_interval: Duration::from_secs(1),
        }
    }
}

impl PollPolicy {
    pub fn fixed(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
            backoff: 1.0,
            max_interval: interval,
        }
    }

    pub fn with_backoff(mut self, factor: f64, max_interval: Duration) -> Self {
        self.backoff = factor;
        self.max_interval = max_interval;
        self
    }

    /// Interval to wait after `current`. Never shrinks below `current`
    /// and never grows past `max_interval`.
    pub fn next_interval(&self, current: Duration) -> Duration {
        if !self.backoff.is_finite() || self.backoff <= 1.0 {
            return current;
        }
        let cap = self.max_interval.max(current);
        Duration::try_from_secs_f64(current.as_secs_f64() * self.backoff)
            .map_or(cap, |next| next.min(cap))
    }

    /// Upper bound on the total time spent sleeping.
    pub fn worst_case(&self) -> Duration {
        let mut total = Duration::ZERO;
        let mut interval = self.interval;
        for _ in 0..self.max_attempts {
            total = total.saturating_add(interval);
            interval = self.next_interval(interval);
        }
        total
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

// ── Sleeper ──────────────────────────────────────────────────────

/// Source of delay between polls; swapped out in tests.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_thirty_seconds() {
        let p = PollPolicy::default();
        assert_eq!(p.max_attempts, 300);
        assert_eq!(p.interval, Duration::from_millis(100));
        assert_eq!(p.worst_case(), Duration::from_secs(30));
    }

    #[test]
    fn backoff_is_capped() {
        let p = PollPolicy::fixed(5, Duration::from_millis(100))
            .with_backoff(2.0, Duration::from_millis(300));
        let mut i = p.interval;
        i = p.next_interval(i);
        assert_eq!(i, Duration::from_millis(200));
        i = p.next_interval(i);
        assert_eq!(i, Duration::from_millis(300));
        i = p.next_interval(i);
        assert_eq!(i, Duration::from_millis(300));
        assert_eq!(p.worst_case(), Duration::from_millis(100 + 200 + 300 + 300 + 300));
    }

    #[test]
    fn huge_backoff_saturates_at_cap() {
        let p = PollPolicy::fixed(3, Duration::from_millis(100))
            .with_backoff(1e30, Duration::from_secs(1));
        assert_eq!(p.next_interval(p.interval), Duration::from_secs(1));
        assert_eq!(p.worst_case(), Duration::from_millis(100 + 1000 + 1000));
    }

    #[test]
    fn shrinking_backoff_ignored() {
        let p = PollPolicy::fixed(3, Duration::from_millis(50)).with_backoff(0.5, Duration::ZERO);
        assert_eq!(p.next_interval(p.interval), Duration::from_millis(50));
    }

    #[tokio::test]
    async fn tokio_sleeper_sleeps() {
        let start = tokio::time::Instant::now();
        TokioSleeper.sleep(Duration::from_millis(10)).await;
        assert!(start.elapsed() >= Duration::from_millis(10));
    }
}
