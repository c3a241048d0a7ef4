use std::pin::Pin;
use std::time::Duration;

use futures_util::future::{self, BoxFuture, FutureExt};
use tokio::time::{Instant, Sleep, sleep};

// Roughly thirty years, used to park a stopped timer.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// A one-shot delay that can be abandoned.
///
/// `tick` resolves when the delay elapses. `stop` disarms the timer and
/// returns `false` when it had already fired, in which case the caller must
/// await `tick` once more to consume the pending fire before dropping it.
pub trait Timer: Send {
    fn tick(&mut self) -> BoxFuture<'_, ()>;

    fn stop(&mut self) -> bool;
}

pub trait TimerFactory: Send + Sync {
    fn start(&self, duration: Duration) -> Box<dyn Timer>;
}

/// Monotonic timer backed by the tokio time driver.
#[derive(Debug, Default)]
pub struct TokioTimerFactory;

impl TimerFactory for TokioTimerFactory {
    fn start(&self, duration: Duration) -> Box<dyn Timer> {
        Box::new(TokioTimer {
            sleep: Box::pin(sleep(duration)),
            stopped: false,
        })
    }
}

struct TokioTimer {
    sleep: Pin<Box<Sleep>>,
    stopped: bool,
}

impl Timer for TokioTimer {
    fn tick(&mut self) -> BoxFuture<'_, ()> {
        self.sleep.as_mut().boxed()
    }

    fn stop(&mut self) -> bool {
        if self.stopped {
            return false;
        }
        self.stopped = true;
        if self.sleep.is_elapsed() {
            return false;
        }
        self.sleep.as_mut().reset(Instant::now() + FAR_FUTURE);
        true
    }
}

/// Timer that fires as soon as it is started, ignoring the duration.
#[derive(Debug, Default)]
pub struct ImmediateTimerFactory;

impl TimerFactory for ImmediateTimerFactory {
    fn start(&self, _duration: Duration) -> Box<dyn Timer> {
        Box::new(ImmediateTimer)
    }
}

struct ImmediateTimer;

impl Timer for ImmediateTimer {
    fn tick(&mut self) -> BoxFuture<'_, ()> {
        future::ready(()).boxed()
    }

    fn stop(&mut self) -> bool {
        false
    }
}
