use crate::runtime::context;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// Suspends the current task for at least `duration`.
///
/// The task yields its worker immediately and is woken by the
/// scheduler's timer thread once the deadline passes; no thread blocks
/// while waiting. Like every suspension point, a sleep is a
/// cancellation point.
///
/// # Panics
///
/// Panics if polled outside the context of a running scheduler.
pub fn sleep(duration: Duration) -> Sleep {
    Sleep {
        deadline: Instant::now() + duration,
        armed: None,
    }
}

/// Future returned by [`sleep`].
///
/// Dropping it before the deadline disarms the pending timer entry.
pub struct Sleep {
    deadline: Instant,

    /// Disarm flag shared with the timer entry, created on first
    /// registration.
    armed: Option<Arc<AtomicBool>>,
}

impl Future for Sleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if Instant::now() >= self.deadline {
            return Poll::Ready(());
        }

        let shared = context::current_sched()
            .expect("sleep must be polled within the context of a scheduler");

        // Re-register on every poll: the waker may have changed. All
        // entries share the disarm flag, so drop still cancels them.
        let cancelled = self
            .armed
            .get_or_insert_with(|| Arc::new(AtomicBool::new(false)))
            .clone();

        shared
            .timer
            .register(self.deadline, cx.waker().clone(), cancelled);

        Poll::Pending
    }
}

impl Drop for Sleep {
    fn drop(&mut self) {
        if let Some(armed) = &self.armed {
            armed.store(true, Ordering::Release);
        }
    }
}
