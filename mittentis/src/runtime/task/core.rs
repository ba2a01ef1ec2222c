use super::handle::{JoinHandle, TaskHandle, wait_terminal};
use super::state::{
    CANCELLED, COMPLETED, CREATED, FAILED, IDLE, NOTIFIED, QUEUED, RUNNING, is_terminal,
};
use super::waker::make_waker;
use crate::error::JoinError;
use crate::runtime::cancel::CancelToken;
use crate::runtime::context;
use crate::runtime::context::{CURRENT_WORKER, enter_task};
use crate::runtime::core::Shared;
use crate::runtime::pools::Context;
use crate::runtime::queues::injector::Injector;
use crate::runtime::registry::{NodeId, Registry};

use std::any::Any;
use std::cell::UnsafeCell;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::task::Poll;

/// A runnable unit of work that can be executed by a worker.
///
/// The `Runnable` trait abstracts the specific return type of a task,
/// allowing the lane queues to hold a heterogeneous collection of
/// tasks through `Arc<dyn Runnable>`.
pub(crate) trait Runnable: Send + Sync {
    /// Executes the task. This is typically called by a worker thread.
    fn run(self: Arc<Self>);
}

/// Type-erased lifecycle surface of a task.
///
/// Handles, the ownership registry, and the shutdown path manage tasks
/// of arbitrary result types through `Arc<dyn Manageable>`.
pub(crate) trait Manageable: Send + Sync {
    /// Requests cooperative cancellation and, if the task is not
    /// currently running, completes the transition to `Cancelled`.
    fn abort(&self);

    /// Current raw lifecycle state.
    fn raw_state(&self) -> usize;

    /// Registers a waker to be notified when the task reaches a
    /// terminal state.
    fn push_waiter(&self, waker: std::task::Waker);

    /// Panic message of a failed task, if any.
    fn failure_message(&self) -> Option<String>;
}

/// A scheduled unit of work managed by the scheduler.
///
/// A `Task` acts as the container for a `Future`. It coordinates the
/// lifecycle of that future: execution state, waker registration,
/// memoized result storage, cancellation, and its node in the
/// ownership registry.
pub(crate) struct Task<T> {
    /// The underlying future.
    ///
    /// Wrapped in `UnsafeCell` for interior mutability during `poll`, and
    /// `Pin<Box<...>>` to ensure the future remains pinned in memory.
    /// Emptied on every terminal transition so that captured resources
    /// are released as soon as the task finishes.
    future: UnsafeCell<Option<Pin<Box<dyn Future<Output = T> + Send>>>>,

    /// Memoized result produced by the future upon completion.
    ///
    /// Written exactly once, on the `Completed` transition; read (and
    /// cloned) arbitrarily often by result handles afterwards.
    pub(crate) result: UnsafeCell<Option<T>>,

    /// Panic message captured on the `Failed` transition.
    failure: Mutex<Option<String>>,

    /// The current lifecycle state of the task.
    pub(crate) state: AtomicUsize,

    /// Injection queue of the task's home lane.
    ///
    /// Wake-ups always re-queue the task here, so a task resumes on the
    /// lane it was submitted to.
    injector: Arc<Injector>,

    /// Wakers of handles awaiting a terminal state.
    pub(crate) waiters: Mutex<Vec<std::task::Waker>>,

    /// Advisory cancellation flag shared with handles and the body.
    token: CancelToken,

    /// The ownership registry this task is recorded in.
    registry: Arc<Registry>,

    /// The task's registry node, bound after insertion and before the
    /// task is first queued.
    node: OnceLock<NodeId>,

    /// Whether an unobserved failure is routed to the process-wide
    /// reporter. Set for fire-and-forget submissions only.
    report_failure: bool,
}

unsafe impl<T> Send for Task<T> {}
unsafe impl<T> Sync for Task<T> {}

impl<T: Send + 'static> Task<T> {
    /// Creates a new task instance from a future.
    ///
    /// The task starts in the `Created` state, ready to be queued.
    pub(crate) fn new<F>(
        future: F,
        injector: Arc<Injector>,
        registry: Arc<Registry>,
        report_failure: bool,
    ) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            future: UnsafeCell::new(Some(Box::pin(future))),
            result: UnsafeCell::new(None),
            failure: Mutex::new(None),
            state: AtomicUsize::new(CREATED),
            injector,
            waiters: Mutex::new(Vec::new()),
            token: CancelToken::new(),
            registry,
            node: OnceLock::new(),
            report_failure,
        }
    }

    /// Records the task's registry node. Must happen before the task
    /// is first queued.
    pub(crate) fn bind(&self, node: NodeId) {
        let _ = self.node.set(node);
    }

    /// The task's registry node, if it was ever registered.
    pub(crate) fn node(&self) -> Option<NodeId> {
        self.node.get().copied()
    }

    /// Performs the execution of the task.
    ///
    /// This method transitions the task to `RUNNING`, polls the inner
    /// future with the per-task context installed, and handles the
    /// outcome:
    /// - `Poll::Pending` with a pending cancellation request: the task
    ///   transitions to `Cancelled`; every suspension point is a
    ///   cancellation point.
    /// - `Poll::Pending` otherwise: back to `IDLE`, or re-queued if a
    ///   wake-up arrived during the poll.
    /// - `Poll::Ready`: the result is memoized and waiters are woken.
    ///   Natural completion wins over a concurrent cancellation
    ///   request.
    /// - a panic: the task transitions to `Failed`; fire-and-forget
    ///   failures are routed to the process-wide reporter.
    pub(crate) fn run(self: Arc<Self>) {
        let current = self.state.load(Ordering::Acquire);

        // Only freshly queued or notified tasks are runnable; a task
        // cancelled while waiting in a queue is dropped here.
        if current != CREATED && current != QUEUED && current != NOTIFIED {
            return;
        }

        // Transition to RUNNING. This ensures exclusive access to the UnsafeCell.
        if self
            .state
            .compare_exchange(current, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let waker = make_waker(self.clone());
        let mut cx = std::task::Context::from_waker(&waker);

        // Safety: the RUNNING state guarantees that no other thread
        // touches the future slot.
        let Some(mut fut) = (unsafe { (*self.future.get()).take() }) else {
            return;
        };

        let poll = match self.node.get().copied() {
            Some(node) => enter_task(node, self.token.clone(), || {
                catch_unwind(AssertUnwindSafe(|| fut.as_mut().poll(&mut cx)))
            }),
            None => catch_unwind(AssertUnwindSafe(|| fut.as_mut().poll(&mut cx))),
        };

        match poll {
            Err(payload) => {
                drop(fut);

                let message = panic_message(&*payload);

                *self.failure.lock().unwrap() = Some(message.clone());
                self.state.store(FAILED, Ordering::Release);

                log::debug!("task failed: {message}");

                if self.report_failure {
                    crate::failure::report(&message);
                }

                self.finish();
            }
            Ok(Poll::Ready(val)) => {
                drop(fut);

                // Safety: still exclusive; the terminal store below is
                // what publishes the result to readers.
                unsafe {
                    *self.result.get() = Some(val);
                }
                self.state.store(COMPLETED, Ordering::Release);

                self.finish();
            }
            Ok(Poll::Pending) => {
                // Suspension point: honor a cancellation request made
                // while the task was running.
                if self.token.is_cancelled() {
                    drop(fut);
                    self.state.store(CANCELLED, Ordering::Release);
                    self.finish();
                    return;
                }

                // Put the future back before leaving RUNNING; once the
                // state changes another worker may pick the task up.
                //
                // Safety: still exclusive, see above.
                unsafe {
                    *self.future.get() = Some(fut);
                }

                // Return to IDLE unless a wake-up occurred during
                // execution (NOTIFIED); in that case re-queue.
                if self
                    .state
                    .compare_exchange(RUNNING, IDLE, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    self.state.store(QUEUED, Ordering::Release);
                    self.injector.push(self.clone());
                }
            }
        }
    }

    /// Signals the task to be rescheduled.
    ///
    /// If the task is `IDLE`, it moves to `QUEUED` and is pushed to its
    /// home lane. If the task is `RUNNING`, it moves to `NOTIFIED` to
    /// ensure it is re-polled immediately after its current slice.
    pub(crate) fn wake(self: Arc<Self>) {
        loop {
            let state = self.state.load(Ordering::Acquire);

            match state {
                IDLE => {
                    if self
                        .state
                        .compare_exchange(IDLE, QUEUED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        self.injector.push(self.clone());
                        return;
                    }
                }
                RUNNING => {
                    if self
                        .state
                        .compare_exchange(RUNNING, NOTIFIED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return;
                    }
                }
                // Already queued, notified, or finished; nothing to do.
                _ => return,
            }
        }
    }

    /// Requests cancellation of this task.
    ///
    /// The token is raised unconditionally. If the task is not
    /// currently running, the transition to `Cancelled` completes here;
    /// a running task keeps executing until its next suspension point
    /// or explicit poll of the token.
    pub(crate) fn abort(&self) {
        self.token.cancel();

        loop {
            let state = self.state.load(Ordering::Acquire);

            // Terminal states are final; a running task is cancelled
            // cooperatively by the suspension check in `run`.
            if is_terminal(state) || state == RUNNING {
                return;
            }

            if self
                .state
                .compare_exchange(state, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                // Safety: winning the CAS from a non-running state
                // grants exclusive access to the future slot; no
                // worker can move the task to RUNNING anymore.
                unsafe {
                    *self.future.get() = None;
                }

                self.finish();
                return;
            }
        }
    }

    /// Terminal-state bookkeeping: releases the registry node and wakes
    /// every waiter.
    ///
    /// Called exactly once per task; every terminal transition is
    /// guarded by a state change that only one thread can win.
    fn finish(&self) {
        if let Some(&node) = self.node.get() {
            self.registry.release(node);
        }

        let mut waiters = self.waiters.lock().unwrap();
        for w in waiters.drain(..) {
            w.wake();
        }
    }
}

impl<T: Send + 'static> Runnable for Task<T> {
    fn run(self: Arc<Self>) {
        Task::run(self)
    }
}

impl<T: Send + 'static> Manageable for Task<T> {
    fn abort(&self) {
        Task::abort(self)
    }

    fn raw_state(&self) -> usize {
        self.state.load(Ordering::Acquire)
    }

    fn push_waiter(&self, waker: std::task::Waker) {
        self.waiters.lock().unwrap().push(waker);
    }

    fn failure_message(&self) -> Option<String> {
        self.failure.lock().unwrap().clone()
    }
}

/// Extracts a readable message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        String::from("task panicked")
    }
}

/// Creates, registers, and queues a task on the given lane.
///
/// The task is inserted into the ownership registry (under `parent`,
/// if any) before it is queued, so a cancellation walk can never miss
/// it. Submitting to a scheduler that has begun shutdown yields a task
/// already in the `Cancelled` state; the work never runs.
pub(crate) fn spawn_raw<F, T>(
    shared: &Arc<Shared>,
    context: Context,
    future: F,
    parent: Option<NodeId>,
    report_failure: bool,
) -> Arc<Task<T>>
where
    T: Send + 'static,
    F: Future<Output = T> + Send + 'static,
{
    let executor = shared.pools.executor(context);
    let task = Arc::new(Task::new(
        future,
        executor.injector(),
        shared.registry.clone(),
        report_failure,
    ));

    if shared.is_shutdown() {
        task.abort();
        return task;
    }

    let dynamic: Arc<dyn Manageable> = task.clone();
    let node = shared.registry.insert(parent, Arc::downgrade(&dynamic));
    task.bind(node);

    log::trace!("spawned task on {} lane", context.name());

    if !executor.submit(task.clone()) {
        // Lost the race with shutdown; the queue refused the task.
        task.abort();
    }

    task
}

/// Builds the type-erased handle for a freshly spawned task.
pub(crate) fn handle_of<T: Send + 'static>(shared: &Arc<Shared>, task: &Arc<Task<T>>) -> TaskHandle {
    let dynamic: Arc<dyn Manageable> = task.clone();
    TaskHandle::new(dynamic, task.node(), shared.registry.clone())
}

/// Schedules `future` on the given lane, fire-and-forget.
///
/// Returns immediately; the caller keeps a [`TaskHandle`] for
/// cancellation and completion observation, but no value. A panic in
/// the body is routed to the process-wide failure reporter.
///
/// When called from inside a task, the new task becomes a child of the
/// caller: cancelling the caller cancels it too. Use
/// [`spawn_independent`] to opt out.
///
/// # Panics
///
/// Panics if called outside the context of a running scheduler.
pub fn spawn<F>(context: Context, future: F) -> TaskHandle
where
    F: Future<Output = ()> + Send + 'static,
{
    let shared = context::current_sched()
        .expect("spawn must be called within the context of a scheduler");
    let parent = context::current_task().map(|(node, _)| node);

    let task = spawn_raw(&shared, context, future, parent, true);
    handle_of(&shared, &task)
}

/// Schedules `future` on the given lane and returns a handle to its
/// eventual value.
///
/// The value is memoized on completion: every `await` or blocking
/// [`join`](JoinHandle::join) observes the same result. Failures are
/// delivered to the joiner as [`JoinError`], not to the process-wide
/// reporter.
///
/// # Panics
///
/// Panics if called outside the context of a running scheduler.
pub fn spawn_result<F, T>(context: Context, future: F) -> JoinHandle<T>
where
    T: Send + 'static,
    F: Future<Output = T> + Send + 'static,
{
    let shared = context::current_sched()
        .expect("spawn_result must be called within the context of a scheduler");
    let parent = context::current_task().map(|(node, _)| node);

    let task = spawn_raw(&shared, context, future, parent, false);
    let handle = handle_of(&shared, &task);

    JoinHandle::new(task, handle)
}

/// Schedules `future` on the given lane as an independent root.
///
/// The new task is not owned by the calling task: cancelling the
/// caller does not cancel it, and a blocking scope does not wait for
/// it. It remains registered with the scheduler and is cancelled on
/// scheduler shutdown.
///
/// # Panics
///
/// Panics if called outside the context of a running scheduler.
pub fn spawn_independent<F>(context: Context, future: F) -> TaskHandle
where
    F: Future<Output = ()> + Send + 'static,
{
    let shared = context::current_sched()
        .expect("spawn_independent must be called within the context of a scheduler");

    let task = spawn_raw(&shared, context, future, None, true);
    handle_of(&shared, &task)
}

/// Runs `future` on another lane and returns its value.
///
/// The future is spawned as a child task on `context`; the caller
/// suspends until it finishes and then resumes on its original lane,
/// so the context switch is scoped to the inner work. Cancellation of
/// the caller propagates to the inner work.
pub async fn with_context<F, T>(context: Context, future: F) -> Result<T, JoinError>
where
    T: Clone + Send + 'static,
    F: Future<Output = T> + Send + 'static,
{
    let mut handle = spawn_result(context, future);
    (&mut handle).await
}

/// Returns `false` once cancellation of the current task has been
/// requested.
///
/// Intended to be polled at loop boundaries by work that wants to
/// honor cancellation without suspending. Outside of a task this is
/// always `true`.
pub fn is_active() -> bool {
    context::current_task().map_or(true, |(_, token)| token.is_active())
}

/// Returns the cancellation token of the current task, if any.
///
/// Useful for handing the advisory flag to code that outlives the
/// polling scope, e.g. a closure passed to a blocking section.
pub fn cancel_token() -> Option<CancelToken> {
    context::current_task().map(|(_, token)| token)
}

/// Returns the lane the current thread is executing on, if it is a
/// scheduler worker.
pub fn current_context() -> Option<Context> {
    CURRENT_WORKER.with(|w| w.borrow().map(|(context, _)| context))
}

/// Suspends until every live child of the current task has reached a
/// terminal state.
///
/// Children spawned while draining (e.g. by other children finishing
/// up) are picked up by the re-collection loop.
pub(crate) async fn drain_children() {
    let Some((node, _)) = context::current_task() else {
        return;
    };
    let Some(shared) = context::current_sched() else {
        return;
    };

    loop {
        let pending: Vec<_> = shared
            .registry
            .live_children(node)
            .into_iter()
            .filter(|t| !is_terminal(t.raw_state()))
            .collect();

        if pending.is_empty() {
            return;
        }

        for task in pending {
            wait_terminal(&task).await;
        }
    }
}
