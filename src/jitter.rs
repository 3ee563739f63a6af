//! Randomisation applied to a backoff interval before sleeping.
//!
//! Samples uniformly from `[interval * (1 - randomization_factor), interval * (1 + randomization_factor)]`,
//! the same windowing the upstream exponential-backoff policy this engine wraps uses.
//! A non-positive `randomization_factor` or a degenerate (empty) window returns `interval`
//! unchanged rather than panicking; the sampled value is floored at zero.

use rand::Rng;
use std::time::Duration;

/// Sample a randomised sleep duration from the window around `interval`.
pub fn randomize(interval: Duration, randomization_factor: f64) -> Duration {
    let mut rng = rand::rng();
    randomize_with_rng(interval, randomization_factor, &mut rng)
}

/// Same as [`randomize`] but with an injected RNG, for deterministic tests.
pub fn randomize_with_rng<R: Rng>(
    interval: Duration,
    randomization_factor: f64,
    rng: &mut R,
) -> Duration {
    if randomization_factor <= 0.0 {
        return interval;
    }
    let base = interval.as_secs_f64();
    let low = base * (1.0 - randomization_factor);
    let high = base * (1.0 + randomization_factor);
    if low >= high {
        return interval;
    }
    let sampled = rng.random_range(low..=high);
    Duration::from_secs_f64(sampled.max(0.0))
}
