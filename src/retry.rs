//! Backoff policy for transient provider failures.

use rand::Rng;
use std::time::Duration;

/// Retry behavior for the dispatch loop.
///
/// The defaults match the production posture for rate-limited LLM APIs:
/// five total attempts, each separated by a pause of 60 seconds plus up to
/// ten seconds of uniform random jitter so concurrent callers do not
/// reconverge on the same instant.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, counting the first one.
    pub max_attempts: u32,
    /// Fixed floor of every pause between attempts.
    pub base_delay: Duration,
    /// Upper bound of the uniform jitter added to the floor.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_secs(60),
            max_jitter: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Policy with a custom attempt cap and the default backoff.
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        RetryPolicy {
            max_attempts,
            ..Default::default()
        }
    }

    /// A policy that never pauses, for tests and interactive tools.
    pub fn immediate(max_attempts: u32) -> Self {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }

    /// Draw the pause to apply before the next attempt.
    pub fn delay(&self) -> Duration {
        if self.max_jitter.is_zero() {
            return self.base_delay;
        }
        let jitter = rand::thread_rng().gen_range(0.0..self.max_jitter.as_secs_f64());
        self.base_delay + Duration::from_secs_f64(jitter)
    }
}
