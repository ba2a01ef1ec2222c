use crate::runtime::context::CURRENT_WORKER;
use crate::runtime::pools::Context;
use crate::runtime::queues::injector::Injector;
use crate::runtime::queues::local::LocalQueue;
use crate::runtime::task::Runnable;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A worker thread of a lane executor.
///
/// A `Worker` repeatedly executes runnable tasks from its lane's
/// queues. Workers of the stealing lane additionally own a local queue
/// and cooperate with their siblings to balance load.
///
/// The execution order is:
/// 1. Pop from the local queue (stealing lane only)
/// 2. Take from the lane injector
/// 3. Steal from sibling workers (stealing lane only)
/// 4. Park if no work is available
pub(crate) struct Worker {
    /// Index of the worker within its lane.
    id: usize,

    /// The lane this worker serves.
    context: Context,

    /// All local queues of the lane (one per worker), if any.
    locals: Option<Arc<Vec<Arc<LocalQueue>>>>,

    /// The lane's injection queue.
    injector: Arc<Injector>,
}

impl Worker {
    /// Creates a new worker.
    pub(crate) fn new(
        id: usize,
        context: Context,
        locals: Option<Arc<Vec<Arc<LocalQueue>>>>,
        injector: Arc<Injector>,
    ) -> Self {
        Self {
            id,
            context,
            locals,
            injector,
        }
    }

    /// Runs the worker event loop.
    ///
    /// The worker repeatedly looks for work until a shutdown signal is
    /// received. The scheduler context is installed by the spawning
    /// executor for the lifetime of the thread; the per-task context is
    /// installed around each poll by the task itself.
    pub(crate) fn run(&self, shutdown: Arc<AtomicBool>) {
        CURRENT_WORKER.with(|w| *w.borrow_mut() = Some((self.context, self.id)));

        log::trace!("{} worker {} started", self.context.name(), self.id);

        loop {
            if shutdown.load(Ordering::Acquire) {
                break;
            }

            if let Some(locals) = &self.locals
                && let Some(task) = locals[self.id].pop()
            {
                task.run();
                continue;
            }

            if let Some(task) = self.injector.steal() {
                task.run();
                continue;
            }

            if let Some(task) = self.try_steal() {
                task.run();
                continue;
            }

            self.injector.park();
        }

        log::trace!("{} worker {} stopped", self.context.name(), self.id);
    }

    /// Attempts to steal a task from a sibling worker's local queue.
    ///
    /// Siblings are visited in a round-robin fashion to avoid
    /// starvation and distribute load evenly.
    fn try_steal(&self) -> Option<Arc<dyn Runnable>> {
        let locals = self.locals.as_ref()?;
        let len = locals.len();

        if len <= 1 {
            return None;
        }

        for i in 0..len {
            let victim = (self.id + i + 1) % len;

            if let Some(task) = locals[victim].steal() {
                return Some(task);
            }
        }
        None
    }
}
