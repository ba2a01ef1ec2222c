//! Mittentis is a small multi-lane task scheduler.
//!
//! It exposes three named execution contexts and routes every unit of
//! work to one of them:
//!
//! - **UI**: a single serial worker. Work submitted to it runs in
//!   submission order, one task at a time.
//! - **I/O**: an elastic pool for work that blocks or waits, grown on
//!   demand up to a configurable cap.
//! - **Compute**: a fixed work-stealing pool sized to the available
//!   parallelism.
//!
//! Work is submitted fire-and-forget with [`spawn`], or with a value
//! handle through [`spawn_result`]; both return immediately. A running
//! task can hop lanes for a scoped section with [`with_context`] and
//! resumes on its home lane afterwards.
//!
//! Tasks form an ownership tree: a task spawned from inside another
//! task is owned by it, and cancelling the parent cancels the whole
//! subtree. Cancellation is cooperative; it takes effect at the next
//! suspension point, or wherever the body polls [`is_active`].
//! [`spawn_independent`] opts a task out of the tree.
//!
//! # Example
//!
//! ```no_run
//! use mittentis::{Context, RuntimeBuilder};
//! use std::time::Duration;
//!
//! let rt = RuntimeBuilder::new().build();
//!
//! let total = rt.block_on(Context::Compute, async {
//!     let part = mittentis::spawn_result(Context::Io, async {
//!         mittentis::sleep(Duration::from_millis(50)).await;
//!         21
//!     });
//!
//!     21 + part.await.unwrap()
//! });
//!
//! assert_eq!(total, 42);
//! ```

pub mod error;

mod failure;
mod runtime;
mod timer;
mod utils;

pub mod time;

/// Task submission and lifecycle utilities.
pub mod task {
    pub use crate::runtime::task::{
        JoinHandle, TaskHandle, TaskState, cancel_token, current_context, is_active, spawn,
        spawn_independent, spawn_result, with_context,
    };
    pub use crate::runtime::yield_now::yield_now;
}

pub use error::{Error, JoinError};
pub use failure::set_failure_hook;
pub use runtime::{
    CancelToken, Context, JoinHandle, Runtime, RuntimeBuilder, TaskHandle, TaskState,
    cancel_token, current_context, is_active, spawn, spawn_independent, spawn_result,
    with_context, yield_now,
};
pub use time::sleep;

pub use mittentis_macros::*;
