/// Reconnection backoff with exponential growth, a ceiling and jitter
///
/// delay(attempt) = min(ceiling, base * 2^attempt) * (1 + U(-jitter, +jitter))
use rand::Rng;
use std::time::Duration;
use tracing::trace;

/// Largest accepted jitter factor (exclusive)
const MAX_JITTER: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first retry
    pub base: Duration,
    /// Upper bound on the un-jittered delay
    pub ceiling: Duration,
    /// Relative jitter in `[0, 1)`; 0.3 means ±30%
    pub jitter: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(1000),
            ceiling: Duration::from_secs(30),
            jitter: 0.3,
        }
    }
}

impl BackoffPolicy {
    pub fn new(base: Duration, ceiling: Duration, jitter: f64) -> Self {
        Self {
            base,
            ceiling,
            jitter,
        }
    }

    /// Delay for `attempt` before jitter is applied
    ///
    /// Non-decreasing in `attempt` and never above `ceiling`.
    pub fn nominal_delay(&self, attempt: u32) -> Duration {
        let Some(factor) = 2u32.checked_pow(attempt) else {
            return self.ceiling;
        };

        self.base
            .checked_mul(factor)
            .map_or(self.ceiling, |delay| delay.min(self.ceiling))
    }

    /// Jittered delay for `attempt` using the supplied random source
    pub fn delay_with<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let nominal = self.nominal_delay(attempt);
        let jitter = self.effective_jitter();

        if jitter == 0.0 || nominal.is_zero() {
            return nominal;
        }

        let factor = 1.0 + rng.gen_range(-jitter..=jitter);
        nominal.mul_f64(factor)
    }

    /// Jittered delay for `attempt` using the thread-local RNG
    pub fn delay(&self, attempt: u32) -> Duration {
        self.delay_with(attempt, &mut rand::thread_rng())
    }

    fn effective_jitter(&self) -> f64 {
        if self.jitter.is_finite() && self.jitter > 0.0 {
            self.jitter.min(MAX_JITTER - f64::EPSILON)
        } else {
            0.0
        }
    }
}

/// Stateful attempt counter over a [`BackoffPolicy`]
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: BackoffPolicy,
    attempt: u32,
}

impl Backoff {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self { policy, attempt: 0 }
    }

    /// Return the attempt number and delay for the next retry, then advance
    pub fn next_delay(&mut self) -> (u32, Duration) {
        let attempt = self.attempt;
        let delay = self.policy.delay(attempt);
        self.attempt = self.attempt.saturating_add(1);

        trace!(attempt, delay_ms = delay.as_millis() as u64, "Computed backoff delay");
        (attempt, delay)
    }

    /// Forget previous failures; the next delay is the base delay again
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Number of delays handed out since the last reset
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }
}
