//! Task lifecycle and submission.
//!
//! A task wraps a future together with its lifecycle state, its
//! memoized result, its cancellation token, and its node in the
//! ownership registry. Submission functions live here too:
//! [`spawn`], [`spawn_result`], [`spawn_independent`], and the scoped
//! lane switch [`with_context`].

pub(crate) mod core;
pub(crate) mod handle;
pub(crate) mod state;
pub(crate) mod waker;

pub use core::{
    cancel_token, current_context, is_active, spawn, spawn_independent, spawn_result, with_context,
};
pub use handle::{JoinHandle, TaskHandle};
pub use state::TaskState;

pub(crate) use core::{Manageable, Runnable, Task, drain_children, handle_of, spawn_raw};
