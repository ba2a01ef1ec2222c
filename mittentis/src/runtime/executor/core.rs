use crate::runtime::context::{CURRENT_WORKER, enter_sched};
use crate::runtime::core::Shared;
use crate::runtime::executor::worker::Worker;
use crate::runtime::pools::Context;
use crate::runtime::queues::injector::Injector;
use crate::runtime::queues::local::LocalQueue;
use crate::runtime::task::Runnable;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::thread::{self, JoinHandle};

/// Worker-pool shape of an execution lane.
pub(crate) enum Flavor {
    /// One worker, FIFO queue only. Tasks submitted to this lane run
    /// serially, in submission order.
    Serial,

    /// FIFO queue served by a pool that grows on demand up to `max`
    /// workers. Growth-only: idle workers park, they are not reaped.
    Elastic { max: usize },

    /// Fixed pool with per-worker local queues and round-robin
    /// stealing.
    Stealing { threads: usize },
}

/// Executor of a single execution lane.
///
/// The `Executor` is responsible for:
/// - spawning worker threads for its lane,
/// - accepting task submissions onto the lane's queues,
/// - growing the elastic pool when submissions outpace workers,
/// - managing orderly shutdown and thread joining.
pub(crate) struct Executor {
    /// The lane this executor serves.
    context: Context,

    /// Pool shape.
    flavor: Flavor,

    /// Injection queue shared by all workers of the lane.
    injector: Arc<Injector>,

    /// Local queues, present only for the stealing flavor.
    locals: Option<Arc<Vec<Arc<LocalQueue>>>>,

    /// Join handles for worker threads. Grows at runtime for the
    /// elastic flavor.
    handles: Mutex<Vec<JoinHandle<()>>>,

    /// Shutdown flag shared with all workers.
    shutdown: Arc<AtomicBool>,

    /// Back-reference to the scheduler, installed by [`start`](Self::start).
    ///
    /// Weak so that worker threads holding the scheduler do not keep
    /// the executor (and therefore themselves) alive.
    shared: OnceLock<Weak<Shared>>,
}

impl Executor {
    /// Creates a lane executor without starting any workers.
    ///
    /// Workers are spawned by [`start`](Self::start) once the scheduler
    /// they must report to exists.
    pub(crate) fn new(context: Context, flavor: Flavor) -> Self {
        let locals = match flavor {
            Flavor::Stealing { threads } => {
                let mut queues = Vec::with_capacity(threads);
                for _ in 0..threads {
                    queues.push(Arc::new(LocalQueue::new()));
                }
                Some(Arc::new(queues))
            }
            _ => None,
        };

        Self {
            context,
            flavor,
            injector: Arc::new(Injector::new()),
            locals,
            handles: Mutex::new(Vec::new()),
            shutdown: Arc::new(AtomicBool::new(false)),
            shared: OnceLock::new(),
        }
    }

    /// Spawns the initial workers of the lane.
    ///
    /// Serial and elastic lanes start with one worker; the stealing
    /// lane starts fully populated.
    pub(crate) fn start(&self, shared: &Arc<Shared>) {
        let _ = self.shared.set(Arc::downgrade(shared));

        let initial = match self.flavor {
            Flavor::Serial | Flavor::Elastic { .. } => 1,
            Flavor::Stealing { threads } => threads,
        };

        for id in 0..initial {
            self.spawn_worker(id, shared.clone());
        }
    }

    /// Returns the lane's injection queue.
    ///
    /// Tasks keep a handle to it so that wake-ups re-queue them on
    /// their home lane.
    pub(crate) fn injector(&self) -> Arc<Injector> {
        self.injector.clone()
    }

    /// Submits a task onto the lane.
    ///
    /// Returns `false` if the lane has begun shutdown and the task was
    /// not accepted.
    pub(crate) fn submit(&self, task: Arc<dyn Runnable>) -> bool {
        if self.shutdown.load(Ordering::Acquire) {
            return false;
        }

        // Local-queue injection for the stealing lane, when the caller
        // is one of its own workers.
        if let Some(locals) = &self.locals {
            let pushed = CURRENT_WORKER.with(|w| match *w.borrow() {
                Some((ctx, id)) if ctx == self.context && id < locals.len() => {
                    locals[id].push(task.clone());
                    true
                }
                _ => false,
            });

            if pushed {
                return true;
            }
        }

        self.injector.push(task);

        if let Flavor::Elastic { max } = self.flavor {
            self.maybe_grow(max);
        }

        true
    }

    /// Spawns an additional elastic worker when the queued backlog
    /// exceeds the parked workers able to absorb it and the pool is
    /// below its cap.
    ///
    /// The cap is advisory under concurrent submission: two racing
    /// submitters may each spawn a worker.
    fn maybe_grow(&self, max: usize) {
        if self.injector.len() <= self.injector.parked() {
            return;
        }

        let count = self.handles.lock().unwrap().len();
        if count >= max {
            return;
        }

        if let Some(shared) = self.shared.get().and_then(Weak::upgrade) {
            log::trace!(
                "growing {} lane to {} workers",
                self.context.name(),
                count + 1
            );
            self.spawn_worker(count, shared);
        }
    }

    /// Spawns one worker thread serving this lane.
    fn spawn_worker(&self, id: usize, shared: Arc<Shared>) {
        let worker = Worker::new(id, self.context, self.locals.clone(), self.injector.clone());
        let sd = self.shutdown.clone();

        let handle = thread::Builder::new()
            .name(format!("mittentis-{}-{}", self.context.name(), id))
            .spawn(move || {
                enter_sched(shared, || {
                    worker.run(sd);
                });
            })
            .expect("failed to spawn worker thread");

        self.handles.lock().unwrap().push(handle);
    }

    /// Signals all workers of the lane to shut down.
    ///
    /// This sets the shutdown flag and wakes all parked workers via
    /// the injector.
    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.injector.shutdown();
    }

    /// Waits for all worker threads of the lane to terminate.
    ///
    /// This should be called after initiating shutdown.
    pub(crate) fn join(&self) {
        let handles: Vec<_> = self.handles.lock().unwrap().drain(..).collect();
        for h in handles {
            let _ = h.join();
        }
    }
}
