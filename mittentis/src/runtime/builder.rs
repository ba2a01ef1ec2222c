use crate::runtime::core::Runtime;

use std::thread;

/// Builder used to configure and create a [`Runtime`] instance.
///
/// The builder lets callers size the compute lane and cap the elastic
/// I/O lane before starting the scheduler. The UI lane is always a
/// single worker; its ordering guarantee depends on it.
///
/// # Example
///
/// ```no_run
/// use mittentis::RuntimeBuilder;
///
/// let rt = RuntimeBuilder::new()
///     .compute_threads(4)
///     .io_max_threads(32)
///     .build();
/// ```
pub struct RuntimeBuilder {
    compute_threads: usize,
    io_max_threads: usize,
}

impl RuntimeBuilder {
    /// Creates a builder with default sizing: one compute worker per
    /// available CPU and an I/O cap of 64 workers.
    pub fn new() -> Self {
        let parallelism = thread::available_parallelism().map_or(4, |n| n.get());

        Self {
            compute_threads: parallelism,
            io_max_threads: 64,
        }
    }

    /// Sets the number of compute-lane worker threads.
    ///
    /// # Panics
    ///
    /// Panics if `count` is zero.
    pub fn compute_threads(mut self, count: usize) -> Self {
        assert!(count > 0, "compute lane requires at least one worker");
        self.compute_threads = count;
        self
    }

    /// Sets the maximum number of I/O-lane worker threads.
    ///
    /// The I/O lane starts with one worker and grows on demand up to
    /// this cap.
    ///
    /// # Panics
    ///
    /// Panics if `count` is zero.
    pub fn io_max_threads(mut self, count: usize) -> Self {
        assert!(count > 0, "io lane requires at least one worker");
        self.io_max_threads = count;
        self
    }

    /// Builds and starts the scheduler.
    pub fn build(self) -> Runtime {
        Runtime::new(self.compute_threads, self.io_max_threads)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
