use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::context::CallContext;
use crate::error::CancelCause;
use crate::timer::{TimerFactory, TokioTimerFactory};

pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_GROWTH_FACTOR: f64 = 1.5;
pub const DEFAULT_JITTER: Duration = Duration::from_millis(50);
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(100);

/// Exponential backoff with symmetric jitter and a floor.
///
/// The delay before retry `attempt` (0-based) is
/// `max(min_delay, round(base_delay * growth_factor^attempt) + jitter)`
/// where `jitter` is drawn uniformly from `[-jitter, +jitter]`.
#[derive(Clone)]
pub struct BackoffPolicy {
    base_delay: Duration,
    growth_factor: f64,
    jitter: Duration,
    min_delay: Duration,
    timer_factory: Arc<dyn TimerFactory>,
}

impl std::fmt::Debug for BackoffPolicy {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("BackoffPolicy")
            .field("base_delay", &self.base_delay)
            .field("growth_factor", &self.growth_factor)
            .field("jitter", &self.jitter)
            .field("min_delay", &self.min_delay)
            .finish()
    }
}

impl BackoffPolicy {
    pub fn standard() -> Self {
        Self::with_timer_factory(Arc::new(TokioTimerFactory))
    }

    pub fn with_timer_factory(timer_factory: Arc<dyn TimerFactory>) -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            growth_factor: DEFAULT_GROWTH_FACTOR,
            jitter: DEFAULT_JITTER,
            min_delay: DEFAULT_MIN_DELAY,
            timer_factory,
        }
    }

    pub fn base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn growth_factor(mut self, growth_factor: f64) -> Self {
        self.growth_factor = if growth_factor.is_finite() {
            growth_factor.max(1.0)
        } else {
            DEFAULT_GROWTH_FACTOR
        };
        self
    }

    pub fn jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn min_delay(mut self, min_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self
    }

    pub fn timer_factory(mut self, timer_factory: Arc<dyn TimerFactory>) -> Self {
        self.timer_factory = timer_factory;
        self
    }

    /// `round(base_delay * growth_factor^attempt)`, saturating.
    pub fn base_delay_for(&self, attempt: usize) -> Duration {
        let exponent = attempt.min(i32::MAX as usize) as i32;
        let scaled_ms = self.base_delay.as_secs_f64() * 1000.0 * self.growth_factor.powi(exponent);
        if !scaled_ms.is_finite() || scaled_ms >= u64::MAX as f64 {
            return Duration::from_millis(u64::MAX);
        }
        Duration::from_millis(scaled_ms.round() as u64)
    }

    pub fn delay_for(&self, attempt: usize) -> Duration {
        let jitter_ms = self.jitter.as_millis().min(i64::MAX as u128) as i64;
        let offset_ms = if jitter_ms > 0 {
            rand::rng().random_range(-jitter_ms..=jitter_ms)
        } else {
            0
        };
        self.delay_with_offset(attempt, offset_ms)
    }

    pub(crate) fn delay_with_offset(&self, attempt: usize, offset_ms: i64) -> Duration {
        let base_ms = self.base_delay_for(attempt).as_millis() as i128;
        let floor_ms = self.min_delay.as_millis() as i128;
        let delay_ms = (base_ms + i128::from(offset_ms))
            .max(floor_ms)
            .clamp(0, i128::from(u64::MAX));
        Duration::from_millis(delay_ms as u64)
    }

    /// Waits out the delay for `attempt`, or returns early with the cause
    /// when the context fires first.
    pub async fn sleep(&self, context: &CallContext, attempt: usize) -> Result<(), CancelCause> {
        let delay = self.delay_for(attempt);
        debug!(attempt, delay_ms = delay.as_millis() as u64, "backing off");
        let mut timer = self.timer_factory.start(delay);
        let cancelled = tokio::select! {
            biased;
            cause = context.done() => Some(cause),
            () = timer.tick() => None,
        };
        let Some(cause) = cancelled else {
            return Ok(());
        };
        if !timer.stop() {
            timer.tick().await;
        }
        Err(cause)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::standard()
    }
}
