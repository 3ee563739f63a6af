//! Randomised exponential backoff with a hard retry-count cap (§4.4).
//!
//! Layers `max_retries` on top of a policy that otherwise only offers
//! `max_elapsed_time` as a stopping condition — mirroring the production system's
//! use of an upstream backoff library via `WithMaxRetries`, reimplemented directly
//! here since this combination (randomisation + max interval + max elapsed time +
//! attempt cap) is not something that library composes on its own.

use crate::backoff::IntervalSchedule;
use crate::clock::{Clock, MonotonicClock};
use crate::jitter::randomize;
use crate::sleeper::{Sleeper, TokioSleeper};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Tunable parameters for one retry engine instance (§3 "Retry engine state").
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub initial_interval: Duration,
    pub multiplier: f64,
    pub randomization_factor: f64,
    pub max_interval: Duration,
    pub max_elapsed_time: Duration,
    pub max_retries: u32,
}

impl RetryConfig {
    /// The defaults used by the production deployment (§4.4).
    pub fn production_default() -> Self {
        Self {
            initial_interval: Duration::from_millis(250),
            multiplier: 1.5,
            randomization_factor: 0.5,
            max_interval: Duration::from_millis(900),
            max_elapsed_time: Duration::from_secs(15),
            max_retries: 3,
        }
    }
}

/// Returned once a retry sequence has stopped without success: either the retry
/// cap was reached or `max_elapsed_time` elapsed.
#[derive(Debug, Error)]
#[error("retry exhausted after {attempts} attempt(s): {last_error}")]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// Per-worker retry engine. Reset (by constructing a fresh instance) before each
/// event's delivery sequence (§4.4: "does not survive events").
pub struct RetryEngine {
    config: RetryConfig,
    schedule: IntervalSchedule,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryEngine {
    pub fn new(config: RetryConfig) -> Self {
        Self::with_clock_and_sleeper(config, Arc::new(MonotonicClock::default()), Arc::new(TokioSleeper))
    }

    pub fn with_clock_and_sleeper(
        config: RetryConfig,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let schedule =
            IntervalSchedule::new(config.initial_interval, config.multiplier, config.max_interval);
        Self { config, schedule, clock, sleeper }
    }

    /// Run `operation` to completion under this engine's retry policy.
    ///
    /// `notify` is invoked once per retry with `(&error, sleep_duration)`, for
    /// operational logging; it is not invoked on the final, unretried failure.
    pub async fn execute<T, E, Fut, Op, Notify>(
        &self,
        mut operation: Op,
        mut notify: Notify,
    ) -> Result<T, RetryExhausted<E>>
    where
        Fut: Future<Output = Result<T, E>>,
        Op: FnMut() -> Fut,
        Notify: FnMut(&E, Duration),
    {
        let start = self.clock.now_millis();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    let retries_done = attempts - 1;
                    let elapsed =
                        Duration::from_millis(self.clock.now_millis().saturating_sub(start));

                    if retries_done >= self.config.max_retries
                        || elapsed >= self.config.max_elapsed_time
                    {
                        return Err(RetryExhausted { attempts, last_error: error });
                    }

                    let retry_number = retries_done + 1;
                    let interval = self.schedule.interval_before_retry(retry_number);
                    let sleep_duration = randomize(interval, self.config.randomization_factor);

                    notify(&error, sleep_duration);
                    self.sleeper.sleep(sleep_duration).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sleeper::TrackingSleeper;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
    #[error("boom: {0}")]
    struct TestError(String);

    fn engine_with(sleeper: TrackingSleeper, max_retries: u32) -> RetryEngine {
        RetryEngine::with_clock_and_sleeper(
            RetryConfig {
                initial_interval: Duration::from_millis(250),
                multiplier: 1.5,
                randomization_factor: 0.5,
                max_interval: Duration::from_millis(900),
                max_elapsed_time: Duration::from_secs(30),
                max_retries,
            },
            Arc::new(MonotonicClock::default()),
            Arc::new(sleeper),
        )
    }

    #[tokio::test]
    async fn succeeds_on_first_attempt_without_sleeping() {
        let sleeper = TrackingSleeper::new();
        let engine = engine_with(sleeper.clone(), 3);
        let counter = AtomicUsize::new(0);

        let result = engine
            .execute(
                || async {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, TestError>(())
                },
                |_, _| {},
            )
            .await;

        assert!(result.is_ok());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(sleeper.calls(), 0);
    }

    #[tokio::test]
    async fn exhausts_after_one_plus_max_retries_attempts() {
        let sleeper = TrackingSleeper::new();
        let engine = engine_with(sleeper.clone(), 3);
        let counter = AtomicUsize::new(0);

        let result = engine
            .execute(
                || async {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(TestError("always fails".to_string()))
                },
                |_, _| {},
            )
            .await;

        let exhausted = result.unwrap_err();
        assert_eq!(exhausted.attempts, 4);
        assert_eq!(counter.load(Ordering::SeqCst), 4);
        assert_eq!(sleeper.calls(), 3);
    }

    #[tokio::test]
    async fn sleep_windows_match_the_documented_table() {
        let sleeper = TrackingSleeper::new();
        let engine = engine_with(sleeper.clone(), 3);

        let _ = engine
            .execute(|| async { Err::<(), _>(TestError("fail".to_string())) }, |_, _| {})
            .await;

        let first = sleeper.call_at(0).unwrap();
        let second = sleeper.call_at(1).unwrap();
        let third = sleeper.call_at(2).unwrap();

        assert!(first >= Duration::from_millis(125) && first <= Duration::from_millis(375));
        assert!(
            second >= Duration::from_micros(187_500) && second <= Duration::from_micros(562_500)
        );
        assert!(
            third >= Duration::from_micros(281_250) && third <= Duration::from_micros(843_750)
        );
    }

    #[tokio::test]
    async fn succeeds_after_recovering_on_second_attempt() {
        let sleeper = TrackingSleeper::new();
        let engine = engine_with(sleeper.clone(), 3);
        let counter = AtomicUsize::new(0);

        let result = engine
            .execute(
                || async {
                    let attempt = counter.fetch_add(1, Ordering::SeqCst);
                    if attempt == 0 {
                        Err::<(), _>(TestError("failed".to_string()))
                    } else {
                        Ok(())
                    }
                },
                |_, _| {},
            )
            .await;

        assert!(result.is_ok());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(sleeper.calls(), 1);
    }

    #[tokio::test]
    async fn notify_callback_receives_error_and_sleep_duration() {
        let sleeper = TrackingSleeper::new();
        let engine = engine_with(sleeper, 2);
        let notified = AtomicUsize::new(0);

        let _ = engine
            .execute(
                || async { Err::<(), _>(TestError("x".to_string())) },
                |error, _sleep| {
                    assert_eq!(error.0, "x");
                    notified.fetch_add(1, Ordering::SeqCst);
                },
            )
            .await;

        assert_eq!(notified.load(Ordering::SeqCst), 2, "one notify per retry, not per attempt");
    }

    #[tokio::test]
    async fn max_elapsed_time_terminates_before_max_retries() {
        let sleeper = TrackingSleeper::new();
        let engine = RetryEngine::with_clock_and_sleeper(
            RetryConfig {
                initial_interval: Duration::from_millis(1),
                multiplier: 1.0,
                randomization_factor: 0.0,
                max_interval: Duration::from_millis(1),
                max_elapsed_time: Duration::from_millis(0),
                max_retries: 10,
            },
            Arc::new(MonotonicClock::default()),
            Arc::new(sleeper),
        );

        let result = engine
            .execute(|| async { Err::<(), _>(TestError("fail".to_string())) }, |_, _| {})
            .await;

        assert_eq!(result.unwrap_err().attempts, 1);
    }
}
