//! Interval schedule for the randomised exponential retry engine.
//!
//! This is deliberately narrower than a general-purpose backoff strategy enum: the
//! retry engine (see [`crate::retry`]) needs exactly one schedule shape — geometric
//! growth from an initial interval, capped by a maximum interval — matching the
//! upstream policy this engine layers a retry-count cap on top of.

use std::time::Duration;

/// Geometric interval schedule: `I_1 = initial`, `I_{n+1} = min(I_n * multiplier, max_interval)`.
#[derive(Debug, Clone, Copy)]
pub struct IntervalSchedule {
    initial_interval: Duration,
    multiplier: f64,
    max_interval: Duration,
}

impl IntervalSchedule {
    pub fn new(initial_interval: Duration, multiplier: f64, max_interval: Duration) -> Self {
        Self { initial_interval, multiplier, max_interval }
    }

    /// The current interval before retry `n` (1-indexed: `n = 1` is the interval
    /// before the first retry, i.e. `I_1`).
    pub fn interval_before_retry(&self, n: u32) -> Duration {
        let mut interval = self.initial_interval;
        for _ in 1..n {
            interval = self.next(interval);
        }
        interval.min(self.max_interval)
    }

    fn next(&self, current: Duration) -> Duration {
        let scaled_secs = current.as_secs_f64() * self.multiplier;
        let scaled = if scaled_secs.is_finite() && scaled_secs >= 0.0 {
            Duration::from_secs_f64(scaled_secs)
        } else {
            self.max_interval
        };
        scaled.min(self.max_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_the_documented_default_schedule() {
        let schedule = IntervalSchedule::new(
            Duration::from_millis(250),
            1.5,
            Duration::from_millis(900),
        );
        assert_eq!(schedule.interval_before_retry(1), Duration::from_millis(250));
        assert_eq!(schedule.interval_before_retry(2), Duration::from_millis(375));
        assert_eq!(schedule.interval_before_retry(3), Duration::from_micros(562_500));
    }

    #[test]
    fn caps_at_max_interval() {
        let schedule =
            IntervalSchedule::new(Duration::from_millis(500), 3.0, Duration::from_millis(900));
        assert_eq!(schedule.interval_before_retry(1), Duration::from_millis(500));
        assert_eq!(schedule.interval_before_retry(2), Duration::from_millis(900));
        assert_eq!(schedule.interval_before_retry(5), Duration::from_millis(900));
    }

    #[test]
    fn handles_zero_initial_interval() {
        let schedule =
            IntervalSchedule::new(Duration::ZERO, 2.0, Duration::from_secs(1));
        assert_eq!(schedule.interval_before_retry(1), Duration::ZERO);
        assert_eq!(schedule.interval_before_retry(4), Duration::ZERO);
    }
}
