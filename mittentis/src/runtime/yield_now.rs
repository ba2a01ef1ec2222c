use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Yields execution back to the scheduler exactly once.
///
/// The first poll wakes the task immediately and returns `Pending`,
/// sending it to the back of its lane's queue. This gives other tasks
/// on the lane a chance to run. Since every suspension point is a
/// cancellation point, it also gives a pending cancellation request a
/// chance to take effect.
pub async fn yield_now() {
    YieldOnce { yielded: false }.await
}

struct YieldOnce {
    yielded: bool,
}

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}
