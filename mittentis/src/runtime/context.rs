use crate::runtime::cancel::CancelToken;
use crate::runtime::core::Shared;
use crate::runtime::pools::Context;
use crate::runtime::registry::NodeId;

use std::cell::RefCell;
use std::sync::Arc;

thread_local! {
    /// Thread-local handle to the current scheduler.
    ///
    /// This is set when entering the scheduler context and allows
    /// components (spawning, timers, the registry) to reach the
    /// scheduler without explicit parameter passing.
    pub(crate) static CURRENT_SCHED: RefCell<Option<Arc<Shared>>> =
        const { RefCell::new(None) };

    /// Thread-local identity of the current worker: the execution
    /// context it serves and its index within that lane.
    pub(crate) static CURRENT_WORKER: RefCell<Option<(Context, usize)>> =
        const { RefCell::new(None) };

    /// Thread-local identity of the task currently being polled:
    /// its registry node and its cancellation token.
    ///
    /// Spawns performed while this is set register the new task as a
    /// child of the current one.
    pub(crate) static CURRENT_TASK: RefCell<Option<(NodeId, CancelToken)>> =
        const { RefCell::new(None) };
}

/// Enters the scheduler execution context for the current thread.
///
/// This function temporarily installs the thread-local scheduler handle
/// for the duration of the closure `f`. After the closure completes,
/// the previous context is restored.
///
/// This mechanism allows deeply nested components to access shared
/// execution state without passing handles through every API.
pub(crate) fn enter_sched<R>(shared: Arc<Shared>, f: impl FnOnce() -> R) -> R {
    CURRENT_SCHED.with(|s| {
        let prev = s.replace(Some(shared));

        let out = f();

        s.replace(prev);

        out
    })
}

/// Enters the context of a specific task for the duration of `f`.
///
/// Installed by a worker around each poll so that spawns inherit
/// parentage and cancellation state from the running task.
pub(crate) fn enter_task<R>(node: NodeId, token: CancelToken, f: impl FnOnce() -> R) -> R {
    CURRENT_TASK.with(|t| {
        let prev = t.replace(Some((node, token)));

        let out = f();

        t.replace(prev);

        out
    })
}

/// Returns the scheduler handle installed on the current thread, if any.
pub(crate) fn current_sched() -> Option<Arc<Shared>> {
    CURRENT_SCHED.with(|s| s.borrow().clone())
}

/// Returns the identity of the task currently being polled, if any.
pub(crate) fn current_task() -> Option<(NodeId, CancelToken)> {
    CURRENT_TASK.with(|t| t.borrow().clone())
}
