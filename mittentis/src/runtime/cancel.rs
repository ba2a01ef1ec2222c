use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Advisory cancellation flag shared between a task and its observers.
///
/// Cancellation in this scheduler is strictly cooperative: requesting it
/// raises the flag, nothing more. The scheduler checks the flag whenever
/// the task suspends, and task bodies may poll it explicitly at loop
/// boundaries via [`is_cancelled`](Self::is_cancelled) or
/// [`task::is_active`](crate::task::is_active).
///
/// A body that never suspends and never polls will run to natural
/// completion despite a pending cancellation request. This is the
/// documented contract, not a defect.
#[derive(Clone)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a fresh, uncancelled token.
    pub(crate) fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Raises the cancellation flag.
    ///
    /// Idempotent; the flag is never lowered again.
    pub(crate) fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Returns `true` once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Convenience inverse of [`is_cancelled`](Self::is_cancelled).
    pub fn is_active(&self) -> bool {
        !self.is_cancelled()
    }
}
