//! Error types used across the scheduler.
//!
//! Two taxonomies exist:
//! - [`Error`] for configuration mistakes detected at submission time,
//! - [`JoinError`] for task outcomes observed through a handle.
//!
//! Cancellation is a terminal task state, not an internal error; it only
//! surfaces as [`JoinError::Cancelled`] to whoever joins or awaits the
//! handle.

use thiserror::Error;

/// Configuration errors raised by the scheduler surface.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The requested execution context name does not match any known lane.
    ///
    /// Raised by [`Context::from_name`](crate::Context::from_name) before
    /// any work is scheduled.
    #[error("unknown execution context `{0}`")]
    UnknownContext(String),
}

/// The reason a joined or awaited task did not produce a value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JoinError {
    /// The task was cancelled before producing a value.
    #[error("task was cancelled")]
    Cancelled,

    /// The task body panicked. The payload message is preserved.
    #[error("task failed: {0}")]
    Failed(String),
}
