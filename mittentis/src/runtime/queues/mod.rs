//! Task queues shared by the executor flavors.
//!
//! Every lane owns one [`Injector`](injector::Injector), the FIFO queue
//! where submitted tasks land and where workers park when idle. The
//! work-stealing lane additionally gives each worker a
//! [`LocalQueue`](local::LocalQueue) for cache locality.

pub(crate) mod injector;
pub(crate) mod local;
