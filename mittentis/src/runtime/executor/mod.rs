//! Lane executors.
//!
//! Each named execution context is served by one [`Executor`] built
//! from the same worker machinery but configured with a different
//! [`Flavor`]: a single serial worker for the UI lane, an elastic
//! growth-on-demand pool for the I/O lane, and a fixed work-stealing
//! pool for the compute lane.

pub(crate) mod core;
pub(crate) mod worker;

pub(crate) use core::{Executor, Flavor};
