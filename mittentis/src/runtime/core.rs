use crate::runtime::context::enter_sched;
use crate::runtime::pools::{Context, Pools};
use crate::runtime::registry::Registry;
use crate::runtime::task::{self, JoinHandle, Manageable, TaskHandle, TaskState};
use crate::timer::{Timer, TimerHandle};

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;

/// State shared between the scheduler handle, its workers, and its
/// tasks.
pub(crate) struct Shared {
    /// The three lane executors.
    pub(crate) pools: Pools,

    /// Ownership registry of every live task.
    pub(crate) registry: Arc<Registry>,

    /// Client handle to the timer thread.
    pub(crate) timer: TimerHandle,

    /// Raised once shutdown begins. Submissions observe it and refuse
    /// new work.
    shutdown: AtomicBool,
}

impl Shared {
    /// Returns `true` once shutdown has begun.
    pub(crate) fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}

/// The scheduler: three named execution lanes, a timer thread, and an
/// ownership registry, behind one handle.
///
/// Built through [`RuntimeBuilder`](crate::RuntimeBuilder). Work is
/// submitted with [`spawn`](Self::spawn) and
/// [`spawn_result`](Self::spawn_result), or run to completion from
/// synchronous code with [`block_on`](Self::block_on).
///
/// Dropping the runtime shuts it down: every live task is cancelled,
/// workers drain and stop, and their threads are joined.
pub struct Runtime {
    shared: Arc<Shared>,
    timer_thread: Mutex<Option<thread::JoinHandle<()>>>,
}

impl Runtime {
    /// Creates and starts a scheduler.
    pub(crate) fn new(compute_threads: usize, io_max_threads: usize) -> Self {
        let (timer, timer_thread) = Timer::start();

        let shared = Arc::new(Shared {
            pools: Pools::new(compute_threads, io_max_threads),
            registry: Arc::new(Registry::new()),
            timer,
            shutdown: AtomicBool::new(false),
        });

        shared.pools.start(&shared);

        log::debug!(
            "scheduler started ({compute_threads} compute workers, io cap {io_max_threads})"
        );

        Self {
            shared,
            timer_thread: Mutex::new(Some(timer_thread)),
        }
    }

    /// Schedules `future` on the given lane, fire-and-forget.
    ///
    /// The task is an independent root: it has no parent and is only
    /// cancelled through its handle or by scheduler shutdown. A panic
    /// in the body is routed to the process-wide failure hook.
    ///
    /// Once shutdown has begun the returned handle is already in the
    /// `Cancelled` state and the work never runs.
    pub fn spawn<F>(&self, context: Context, future: F) -> TaskHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let t = task::spawn_raw(&self.shared, context, future, None, true);
        task::handle_of(&self.shared, &t)
    }

    /// Schedules `future` on the given lane and returns a handle to
    /// its eventual value.
    pub fn spawn_result<F, T>(&self, context: Context, future: F) -> JoinHandle<T>
    where
        T: Send + 'static,
        F: Future<Output = T> + Send + 'static,
    {
        let t = task::spawn_raw(&self.shared, context, future, None, false);
        let handle = task::handle_of(&self.shared, &t);

        JoinHandle::new(t, handle)
    }

    /// Runs `future` to completion on the given lane, blocking the
    /// calling thread.
    ///
    /// Before returning, every task spawned within the future (and not
    /// detached as an independent root) is waited for; the scope only
    /// closes once its children are done. The calling thread must not
    /// be a worker of this scheduler.
    ///
    /// # Panics
    ///
    /// Panics if the future's body panics, or if the scheduler shuts
    /// down before the future completes.
    pub fn block_on<F, T>(&self, context: Context, future: F) -> T
    where
        T: Send + 'static,
        F: Future<Output = T> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();

        let wrapped = async move {
            let value = future.await;
            task::drain_children().await;
            let _ = tx.send(value);
        };

        let t = task::spawn_raw(&self.shared, context, wrapped, None, false);
        let handle = task::handle_of(&self.shared, &t);

        match rx.recv() {
            Ok(value) => value,
            // The sender dropped without sending: the task died.
            Err(_) => match handle.join() {
                TaskState::Failed => {
                    let message = t
                        .failure_message()
                        .unwrap_or_else(|| String::from("task panicked"));
                    panic!("blocking task failed: {message}")
                }
                _ => panic!("blocking task was cancelled"),
            },
        }
    }

    /// Runs a closure with this scheduler installed as the thread's
    /// current one.
    ///
    /// Free functions such as [`spawn`](crate::spawn) resolve the
    /// scheduler through the installed context; worker threads have it
    /// installed for their whole lifetime, other threads can use this
    /// to get the same access.
    pub fn enter<R>(&self, f: impl FnOnce() -> R) -> R {
        enter_sched(self.shared.clone(), f)
    }

    /// Shuts the scheduler down.
    ///
    /// Every live task is cancelled, lane queues stop accepting work,
    /// worker and timer threads are signalled and joined. Idempotent;
    /// also performed on drop.
    pub fn shutdown(&self) {
        if self.shared.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }

        log::debug!("scheduler shutting down");

        for t in self.shared.registry.collect_all() {
            t.abort();
        }

        self.shared.pools.shutdown();
        self.shared.pools.join();

        self.shared.timer.shutdown();
        if let Some(handle) = self.timer_thread.lock().unwrap().take() {
            let _ = handle.join();
        }

        log::debug!("scheduler stopped");
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.shutdown();
    }
}
