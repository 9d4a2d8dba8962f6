//! Per-source pacing of page actions.
//!
//! Each running source owns one [`RateLimiter`]. `wait()` suspends until the
//! current delay has passed since the previous call returned; the delay adapts
//! between a floor and a ceiling when a site starts pushing back.

use rand::Rng;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Default adaptive step.
const DEFAULT_STEP: Duration = Duration::from_millis(1000);

/// Default jitter, as a fraction of the base delay.
const DEFAULT_JITTER: f64 = 0.3;

/// Tuning for a [`RateLimiter`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimiterOptions {
    /// Delay in force after construction and after `reset()`
    pub initial_delay: Duration,
    /// Lower bound for `decrease_delay()`
    pub min_delay: Duration,
    /// Upper bound for `increase_delay()`
    pub max_delay: Duration,
    /// Amount added or removed by one adaptation
    pub adaptive_step: Duration,
    /// Fractional variance applied by [`RateLimiter::jittered_pause`]
    pub jitter: f64,
}

impl RateLimiterOptions {
    /// Options derived from an initial delay: the floor equals the initial
    /// delay and the ceiling is three times it.
    #[must_use]
    pub fn from_initial(initial_delay: Duration) -> Self {
        Self {
            initial_delay,
            min_delay: initial_delay,
            max_delay: initial_delay * 3,
            adaptive_step: DEFAULT_STEP,
            jitter: DEFAULT_JITTER,
        }
    }
}

#[derive(Debug)]
struct LimiterState {
    last_call: Option<Instant>,
    current_delay: Duration,
}

/// Throttles consecutive actions of one source.
#[derive(Debug)]
pub struct RateLimiter {
    options: RateLimiterOptions,
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    /// Create a limiter with default bounds around `initial_delay`.
    #[must_use]
    pub fn new(initial_delay: Duration) -> Self {
        Self::with_options(RateLimiterOptions::from_initial(initial_delay))
    }

    /// Create a limiter with explicit options.
    #[must_use]
    pub fn with_options(options: RateLimiterOptions) -> Self {
        Self {
            state: Mutex::new(LimiterState {
                last_call: None,
                current_delay: options.initial_delay,
            }),
            options,
        }
    }

    /// Suspend until at least the current delay has elapsed since the
    /// previous `wait()` returned. The first call never sleeps.
    pub async fn wait(&self) {
        let mut state = self.state.lock().await;
        if let Some(last) = state.last_call {
            let elapsed = last.elapsed();
            if elapsed < state.current_delay {
                let remaining = state.current_delay - elapsed;
                tracing::trace!(remaining_ms = remaining.as_millis(), "rate limiter sleeping");
                tokio::time::sleep(remaining).await;
            }
        }
        state.last_call = Some(Instant::now());
    }

    /// Sleep for the current delay randomized by the configured jitter.
    ///
    /// Sources call this between result pages so their cadence is not fixed.
    pub async fn jittered_pause(&self) {
        let base = self.current_delay().await;
        tokio::time::sleep(randomized_delay(base, self.options.jitter)).await;
    }

    /// Back off by one step, capped at the maximum delay.
    pub async fn increase_delay(&self) {
        let mut state = self.state.lock().await;
        state.current_delay =
            (state.current_delay + self.options.adaptive_step).min(self.options.max_delay);
        tracing::debug!(
            delay_ms = state.current_delay.as_millis(),
            "rate limiter backing off"
        );
    }

    /// Speed up by one step, floored at the minimum delay.
    pub async fn decrease_delay(&self) {
        let mut state = self.state.lock().await;
        state.current_delay = state
            .current_delay
            .saturating_sub(self.options.adaptive_step)
            .max(self.options.min_delay);
    }

    /// Forget the previous call and restore the initial delay.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.last_call = None;
        state.current_delay = self.options.initial_delay;
    }

    /// The delay currently enforced by `wait()`.
    pub async fn current_delay(&self) -> Duration {
        self.state.lock().await.current_delay
    }
}

/// `base` randomized uniformly within `±variance` (a fraction of `base`).
#[must_use]
pub fn randomized_delay(base: Duration, variance: f64) -> Duration {
    let variance = variance.clamp(0.0, 1.0);
    if variance == 0.0 || base.is_zero() {
        return base;
    }
    let factor = rand::thread_rng().gen_range((1.0 - variance)..=(1.0 + variance));
    base.mul_f64(factor)
}
