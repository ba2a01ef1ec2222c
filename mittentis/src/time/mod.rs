//! Time utilities built on the scheduler's timer thread.

pub(crate) mod sleep;

pub use sleep::{Sleep, sleep};
