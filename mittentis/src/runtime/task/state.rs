/// Task is queued for its first execution.
///
/// The task has been submitted but no worker has polled it yet.
pub(crate) const CREATED: usize = 0;

/// Task has been re-queued after a wake-up.
///
/// The task already ran at least once and is waiting in a run queue.
pub(crate) const QUEUED: usize = 1;

/// Task is currently being executed by a worker.
///
/// At most one worker may observe this state at a time.
pub(crate) const RUNNING: usize = 2;

/// Task is suspended and not scheduled.
///
/// The task returned `Pending` and waits for a wake-up.
pub(crate) const IDLE: usize = 3;

/// Task has been notified while running.
///
/// This state indicates that the task was woken while already
/// executing and should be re-queued once execution finishes.
pub(crate) const NOTIFIED: usize = 4;

/// Task has completed execution normally.
///
/// The future has returned `Poll::Ready` and will not be polled again.
pub(crate) const COMPLETED: usize = 5;

/// Task body raised a panic.
pub(crate) const FAILED: usize = 6;

/// Task has been cancelled before reaching completion.
pub(crate) const CANCELLED: usize = 7;

/// Returns `true` if `state` is one of the three terminal states.
///
/// No transition ever leaves a terminal state.
pub(crate) fn is_terminal(state: usize) -> bool {
    matches!(state, COMPLETED | FAILED | CANCELLED)
}

/// Publicly observable lifecycle of a task.
///
/// The scheduler internally tracks queued, suspended, and notified
/// sub-states; all of them surface as [`Running`](TaskState::Running)
/// once the task has been polled at least once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Submitted, never polled.
    Created,
    /// Polled at least once and not yet terminal.
    Running,
    /// Completed normally. Terminal.
    Completed,
    /// The task body panicked. Terminal.
    Failed,
    /// Cancelled before completion. Terminal.
    Cancelled,
}

impl TaskState {
    /// Maps a raw internal state to the public lifecycle.
    pub(crate) fn from_raw(raw: usize) -> Self {
        match raw {
            CREATED => TaskState::Created,
            COMPLETED => TaskState::Completed,
            FAILED => TaskState::Failed,
            CANCELLED => TaskState::Cancelled,
            _ => TaskState::Running,
        }
    }

    /// Returns `true` for `Completed`, `Failed`, and `Cancelled`.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Cancelled
        )
    }
}
