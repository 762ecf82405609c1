//! Fixed-cadence refresh timers
//!
//! A `Cadence` is polled rather than spawned: the owner asks whether a
//! period elapsed and runs the refresh itself, so no task needs shared
//! access to the state being refreshed.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct Cadence {
    period: Duration,
    next: Instant,
}

impl Cadence {
    /// First due one `period` from now
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next: Instant::now() + period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// True at most once per elapsed period. Missed periods collapse into
    /// one; the next period starts from the moment this returned true.
    pub fn is_due(&mut self) -> bool {
        let now = Instant::now();
        if now < self.next {
            return false;
        }
        self.next = now + self.period;
        true
    }

    /// Time left until the next period elapses
    pub fn remaining(&self) -> Duration {
        self.next.saturating_duration_since(Instant::now())
    }

    /// Sleep until due, then start the next period
    pub async fn tick(&mut self) {
        tokio::time::sleep_until(self.next).await;
        self.next = Instant::now() + self.period;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_due_once_per_period() {
        let mut cadence = Cadence::new(Duration::from_secs(15));
        assert!(!cadence.is_due());

        tokio::time::advance(Duration::from_secs(15)).await;
        assert!(cadence.is_due());
        assert!(!cadence.is_due());

        // Three missed periods still fire once
        tokio::time::advance(Duration::from_secs(45)).await;
        assert!(cadence.is_due());
        assert!(!cadence.is_due());
        assert_eq!(cadence.remaining(), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_waits_out_the_period() {
        let mut cadence = Cadence::new(Duration::from_secs(30));
        let start = Instant::now();
        cadence.tick().await;
        assert_eq!(start.elapsed(), Duration::from_secs(30));
        assert!(!cadence.is_due());
    }
}
