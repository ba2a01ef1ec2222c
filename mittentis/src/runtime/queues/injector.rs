use crate::runtime::task::Runnable;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// FIFO injection queue of an execution lane.
///
/// The injector is the centralized queue where newly submitted tasks
/// are pushed before being picked up by the lane's workers. Because it
/// is strictly first-in first-out, a lane served by a single worker
/// executes tasks in submission order.
///
/// It also coordinates worker parking and waking using a condition
/// variable, allowing workers to sleep when no work is available. The
/// parked-worker count and queue depth double as the growth signal for
/// the elastic lane: a submission that leaves more queued tasks than
/// parked workers may spawn a new worker.
pub(crate) struct Injector {
    /// Queue holding injected tasks.
    queue: Mutex<VecDeque<std::sync::Arc<dyn Runnable>>>,

    /// Number of currently parked worker threads.
    parked: Mutex<usize>,

    /// Condition variable used to wake parked workers.
    condvar: Condvar,

    /// Indicates whether the lane is shutting down.
    shutdown: AtomicBool,
}

impl Injector {
    /// Creates a new empty injector.
    pub(crate) fn new() -> Self {
        Injector {
            queue: Mutex::new(VecDeque::new()),
            parked: Mutex::new(0),
            condvar: Condvar::new(),
            shutdown: AtomicBool::new(false),
        }
    }

    /// Signals shutdown and wakes all parked workers.
    ///
    /// After shutdown is initiated, workers should stop parking
    /// and eventually exit.
    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.condvar.notify_all();
    }

    /// Pushes a task onto the back of the queue.
    ///
    /// This wakes any parked worker threads.
    pub(crate) fn push(&self, task: std::sync::Arc<dyn Runnable>) {
        self.queue.lock().unwrap().push_back(task);
        self.condvar.notify_all();
    }

    /// Parks the current worker thread until work becomes available
    /// or a shutdown signal is received.
    ///
    /// Workers only park if the queue is empty.
    /// The park operation uses a timed wait to ensure periodic wakeups.
    pub(crate) fn park(&self) {
        if self.shutdown.load(Ordering::Acquire) {
            return;
        }

        if !self.queue.lock().unwrap().is_empty() {
            return;
        }

        let mut parked = self.parked.lock().unwrap();
        *parked += 1;

        let (mut parked, _) = self
            .condvar
            .wait_timeout(parked, Duration::from_millis(1))
            .unwrap();

        *parked -= 1;
    }

    /// Number of workers currently parked on this injector.
    pub(crate) fn parked(&self) -> usize {
        *self.parked.lock().unwrap()
    }

    /// Number of tasks currently waiting in the queue.
    pub(crate) fn len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// Takes a task from the front of the queue.
    ///
    /// Returns `None` if no tasks are available.
    pub(crate) fn steal(&self) -> Option<std::sync::Arc<dyn Runnable>> {
        self.queue.lock().unwrap().pop_front()
    }
}
