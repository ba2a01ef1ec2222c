use crate::error::Error;
use crate::runtime::core::Shared;
use crate::runtime::executor::{Executor, Flavor};

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A named execution context: the lane a unit of work is scheduled on.
///
/// Three lanes exist:
/// - [`Ui`](Context::Ui): a single logical thread. Work submitted to
///   it from the same caller executes serially, in submission order.
/// - [`Io`](Context::Io): an elastic pool for work that blocks or
///   waits, grown on demand up to a cap.
/// - [`Compute`](Context::Compute): a fixed work-stealing pool sized
///   to the available parallelism. The default lane for CPU-bound work.
///
/// The I/O and compute lanes provide no cross-task ordering guarantee;
/// tasks submitted to them may run concurrently and interleave freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    /// Single serial worker, order-preserving.
    Ui,
    /// Elastic pool for blocking or waiting work.
    Io,
    /// Fixed work-stealing pool for CPU-bound work.
    Compute,
}

impl Context {
    /// Resolves a lane from its configuration name.
    ///
    /// Recognized names are `"ui"`, `"io"`, and `"compute"`
    /// (case-insensitive). Anything else is a configuration error,
    /// raised before any work is scheduled.
    pub fn from_name(name: &str) -> Result<Self, Error> {
        match name.to_ascii_lowercase().as_str() {
            "ui" => Ok(Context::Ui),
            "io" => Ok(Context::Io),
            "compute" => Ok(Context::Compute),
            _ => Err(Error::UnknownContext(name.to_string())),
        }
    }

    /// Canonical lane name, used in thread names and logs.
    pub(crate) fn name(self) -> &'static str {
        match self {
            Context::Ui => "ui",
            Context::Io => "io",
            Context::Compute => "compute",
        }
    }
}

impl FromStr for Context {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Context::from_name(s)
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The three lane executors of a scheduler.
pub(crate) struct Pools {
    ui: Executor,
    io: Executor,
    compute: Executor,
}

impl Pools {
    /// Creates the lane executors without starting any workers.
    pub(crate) fn new(compute_threads: usize, io_max_threads: usize) -> Self {
        Self {
            ui: Executor::new(Context::Ui, Flavor::Serial),
            io: Executor::new(
                Context::Io,
                Flavor::Elastic {
                    max: io_max_threads,
                },
            ),
            compute: Executor::new(
                Context::Compute,
                Flavor::Stealing {
                    threads: compute_threads,
                },
            ),
        }
    }

    /// Returns the executor serving `context`.
    pub(crate) fn executor(&self, context: Context) -> &Executor {
        match context {
            Context::Ui => &self.ui,
            Context::Io => &self.io,
            Context::Compute => &self.compute,
        }
    }

    /// Starts the workers of every lane.
    pub(crate) fn start(&self, shared: &Arc<Shared>) {
        self.ui.start(shared);
        self.io.start(shared);
        self.compute.start(shared);
    }

    /// Signals every lane to shut down.
    pub(crate) fn shutdown(&self) {
        self.ui.shutdown();
        self.io.shutdown();
        self.compute.shutdown();
    }

    /// Joins the worker threads of every lane.
    pub(crate) fn join(&self) {
        self.ui.join();
        self.io.join();
        self.compute.join();
    }
}
