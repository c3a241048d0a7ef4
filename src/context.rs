use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::error::CancelCause;

/// Cancellation signal attached to a single call.
///
/// A context fires either when its token is cancelled or when its optional
/// deadline passes. Clones share the token, so cancelling one clone cancels
/// every call that was handed a clone.
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Tightens the deadline to `now + timeout`; a later deadline never
    /// replaces an earlier one.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        self.with_deadline(deadline)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Cause if the context has already fired, without waiting.
    pub fn cause(&self) -> Option<CancelCause> {
        if self.token.is_cancelled() {
            return Some(CancelCause::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelCause::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the context fires.
    pub async fn done(&self) -> CancelCause {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    () = self.token.cancelled() => CancelCause::Cancelled,
                    () = sleep_until(deadline) => CancelCause::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                CancelCause::Cancelled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::CallContext;
    use crate::error::CancelCause;

    #[tokio::test(start_paused = true)]
    async fn deadline_fires_as_deadline_exceeded() {
        let context = CallContext::new().with_timeout(Duration::from_millis(30));
        assert_eq!(context.cause(), None);
        assert_eq!(context.done().await, CancelCause::DeadlineExceeded);
        assert_eq!(context.cause(), Some(CancelCause::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn earlier_deadline_wins() {
        let context = CallContext::new()
            .with_timeout(Duration::from_millis(10))
            .with_timeout(Duration::from_secs(60));
        let deadline = context.deadline().expect("deadline should be set");
        assert!(deadline <= tokio::time::Instant::now() + Duration::from_millis(10));
    }

    #[tokio::test]
    async fn cancelled_token_reports_cancelled() {
        let context = CallContext::new().with_timeout(Duration::from_secs(60));
        context.clone().cancel();
        assert_eq!(context.done().await, CancelCause::Cancelled);
    }
}
