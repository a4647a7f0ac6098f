//! Caller-side deadline and cancellation for `Engine::verify`.
//!
//! Argon2 derivation cannot be interrupted once started, so the engine checks
//! the context before deriving and again before comparing.

use std::time::{Duration, Instant};

use tokio::sync::watch;

#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

impl Context {
    /// A context that never expires.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context plus the sender that cancels it (send `true`).
    pub fn cancellable() -> (Self, watch::Sender<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self::background().with_cancel(rx), tx)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn is_done(&self) -> bool {
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return true;
        }
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_never_done() {
        assert!(!Context::background().is_done());
    }

    #[test]
    fn expired_deadline_is_done() {
        let ctx = Context::background().with_timeout(Duration::ZERO);
        assert!(ctx.is_done());

        let ctx = Context::background().with_timeout(Duration::from_secs(60));
        assert!(!ctx.is_done());
    }

    #[test]
    fn earliest_deadline_wins() {
        let ctx = Context::background()
            .with_timeout(Duration::ZERO)
            .with_timeout(Duration::from_secs(60));
        assert!(ctx.is_done());
    }

    #[test]
    fn cancel_signal_marks_done() {
        let (ctx, cancel) = Context::cancellable();
        assert!(!ctx.is_done());

        cancel.send(true).unwrap();
        assert!(ctx.is_done());
    }

    #[test]
    fn cancel_survives_dropped_sender() {
        let (ctx, cancel) = Context::cancellable();
        cancel.send(true).unwrap();
        drop(cancel);
        assert!(ctx.is_done());
    }
}
