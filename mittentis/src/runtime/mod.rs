//! The scheduler core.
//!
//! Three named execution lanes (UI, I/O, compute), the task lifecycle
//! machinery, the ownership registry driving structured cancellation,
//! and the blocking entry point live here.

pub(crate) mod builder;
pub(crate) mod cancel;
pub(crate) mod context;
pub(crate) mod core;
pub(crate) mod executor;
pub(crate) mod pools;
pub(crate) mod queues;
pub(crate) mod registry;
pub(crate) mod task;
pub(crate) mod yield_now;

pub use builder::RuntimeBuilder;
pub use cancel::CancelToken;
pub use core::Runtime;
pub use pools::Context;
pub use task::{
    JoinHandle, TaskHandle, TaskState, cancel_token, current_context, is_active, spawn,
    spawn_independent, spawn_result, with_context,
};
pub use yield_now::yield_now;
