use super::core::{Manageable, Task};
use super::state::{COMPLETED, FAILED, TaskState, is_terminal};
use crate::error::JoinError;
use crate::runtime::registry::{NodeId, Registry};

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Poll, Wake, Waker};
use std::thread::{self, Thread};

/// Handle to a fire-and-forget task.
///
/// The handle observes the task's lifecycle and requests cancellation;
/// it carries no value. Dropping it detaches from the task, which keeps
/// running.
///
/// Cancellation through a `TaskHandle` propagates: every task the
/// target spawned (and their descendants, transitively) is cancelled
/// with it, except tasks spawned as independent roots.
#[derive(Clone)]
pub struct TaskHandle {
    task: Arc<dyn Manageable>,
    node: Option<NodeId>,
    registry: Arc<Registry>,
}

impl TaskHandle {
    pub(crate) fn new(
        task: Arc<dyn Manageable>,
        node: Option<NodeId>,
        registry: Arc<Registry>,
    ) -> Self {
        Self {
            task,
            node,
            registry,
        }
    }

    /// Current lifecycle state of the task.
    pub fn state(&self) -> TaskState {
        TaskState::from_raw(self.task.raw_state())
    }

    /// Returns `true` once the task reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    /// Requests cancellation of the task and everything it owns.
    ///
    /// The whole ownership subtree is collected first, then aborted
    /// outside the registry lock. A task in the middle of a poll keeps
    /// running until its next suspension point; a task that never
    /// suspends and never polls its token runs to natural completion.
    ///
    /// Idempotent, and a no-op on a task that already finished.
    pub fn cancel(&self) {
        let targets = match self.node {
            Some(node) => self.registry.collect_subtree(node),
            None => Vec::new(),
        };

        if targets.is_empty() {
            // Never registered, or already released: abort directly.
            self.task.abort();
            return;
        }

        log::debug!("cancelling task subtree of {} task(s)", targets.len());

        for task in targets {
            task.abort();
        }
    }

    /// Blocks the calling thread until the task reaches a terminal
    /// state.
    ///
    /// Must not be called from a worker thread of the scheduler; doing
    /// so stalls the lane. Use [`wait`](Self::wait) from async code.
    pub fn join(&self) -> TaskState {
        block_until_terminal(&self.task);
        self.state()
    }

    /// Suspends until the task reaches a terminal state.
    pub async fn wait(&self) -> TaskState {
        wait_terminal(&self.task).await;
        self.state()
    }
}

/// Handle to a task that produces a value.
///
/// A `JoinHandle` is obtained from [`spawn_result`](super::spawn_result)
/// and resolves to the task's memoized outcome. The value is cloned out
/// on every read, so the handle may be awaited or joined repeatedly and
/// always observes the same result.
pub struct JoinHandle<T> {
    task: Arc<Task<T>>,
    handle: TaskHandle,
}

impl<T: Send + 'static> JoinHandle<T> {
    pub(crate) fn new(task: Arc<Task<T>>, handle: TaskHandle) -> Self {
        Self { task, handle }
    }

    /// Current lifecycle state of the task.
    pub fn state(&self) -> TaskState {
        self.handle.state()
    }

    /// Returns `true` once the task reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Requests cancellation of the task and everything it owns.
    ///
    /// A pending or future read of the value yields
    /// [`JoinError::Cancelled`].
    pub fn cancel(&self) {
        self.handle.cancel();
    }

    /// The type-erased lifecycle handle of this task.
    pub fn as_task_handle(&self) -> &TaskHandle {
        &self.handle
    }
}

impl<T: Clone + Send + 'static> JoinHandle<T> {
    /// Blocks the calling thread until the value is available.
    ///
    /// Must not be called from a worker thread of the scheduler; doing
    /// so stalls the lane. Await the handle from async code instead.
    pub fn join(&self) -> Result<T, JoinError> {
        block_until_terminal(&self.handle.task);
        self.outcome()
            .unwrap_or(Err(JoinError::Failed(String::from("task vanished"))))
    }

    /// Reads the memoized outcome, if the task is terminal.
    fn outcome(&self) -> Option<Result<T, JoinError>> {
        let raw = self.task.state.load(Ordering::Acquire);

        if !is_terminal(raw) {
            return None;
        }

        let out = match raw {
            COMPLETED => {
                // Safety: the result slot was written before the
                // COMPLETED store and is never written again.
                let value = unsafe { (*self.task.result.get()).clone() };
                match value {
                    Some(v) => Ok(v),
                    None => Err(JoinError::Failed(String::from("result missing"))),
                }
            }
            FAILED => Err(JoinError::Failed(
                self.handle
                    .task
                    .failure_message()
                    .unwrap_or_else(|| String::from("task panicked")),
            )),
            _ => Err(JoinError::Cancelled),
        };

        Some(out)
    }
}

impl<T: Clone + Send + 'static> Future for JoinHandle<T> {
    type Output = Result<T, JoinError>;

    fn poll(self: Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> Poll<Self::Output> {
        if let Some(out) = self.outcome() {
            return Poll::Ready(out);
        }

        self.task.waiters.lock().unwrap().push(cx.waker().clone());

        // Re-check: the task may have finished between the state load
        // and the waker registration.
        match self.outcome() {
            Some(out) => Poll::Ready(out),
            None => Poll::Pending,
        }
    }
}

/// Suspends until `task` reaches a terminal state.
pub(crate) fn wait_terminal(task: &Arc<dyn Manageable>) -> WaitTerminal {
    WaitTerminal { task: task.clone() }
}

/// Future resolving once a task is terminal. See [`wait_terminal`].
pub(crate) struct WaitTerminal {
    task: Arc<dyn Manageable>,
}

impl Future for WaitTerminal {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> Poll<Self::Output> {
        if is_terminal(self.task.raw_state()) {
            return Poll::Ready(());
        }

        self.task.push_waiter(cx.waker().clone());

        if is_terminal(self.task.raw_state()) {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

/// Waker that unparks a blocked OS thread.
struct ThreadWaker {
    thread: Thread,
    woken: AtomicBool,
}

impl Wake for ThreadWaker {
    fn wake(self: Arc<Self>) {
        self.woken.store(true, Ordering::Release);
        self.thread.unpark();
    }
}

/// Parks the calling thread until `task` reaches a terminal state.
pub(crate) fn block_until_terminal(task: &Arc<dyn Manageable>) {
    loop {
        if is_terminal(task.raw_state()) {
            return;
        }

        let waker = Arc::new(ThreadWaker {
            thread: thread::current(),
            woken: AtomicBool::new(false),
        });
        task.push_waiter(Waker::from(waker.clone()));

        if is_terminal(task.raw_state()) {
            return;
        }

        // Park until woken; unpark may have happened already, in which
        // case park returns immediately.
        while !waker.woken.load(Ordering::Acquire) {
            thread::park();
        }
    }
}
