use mittentis::{Context, JoinError, RuntimeBuilder, TaskState, task};

use std::time::Duration;

#[test]
fn test_await_twice_returns_the_same_value() {
    let rt = RuntimeBuilder::new().compute_threads(2).build();

    let (first, second) = rt.block_on(Context::Compute, async {
        let mut handle = task::spawn_result(Context::Compute, async { 11 * 5 });

        let first = (&mut handle).await;
        let second = (&mut handle).await;

        (first, second)
    });

    assert_eq!(first, Ok(55));
    assert_eq!(second, Ok(55));
}

#[test]
fn test_blocking_join_is_idempotent() {
    let rt = RuntimeBuilder::new().compute_threads(2).build();

    let handle = rt.spawn_result(Context::Compute, async { 23 * 5 });

    assert_eq!(handle.join(), Ok(115));
    assert_eq!(handle.join(), Ok(115));
    assert_eq!(handle.state(), TaskState::Completed);
}

#[test]
fn test_panic_surfaces_as_failed() {
    let rt = RuntimeBuilder::new().compute_threads(2).build();

    let handle = rt.spawn_result::<_, i32>(Context::Compute, async { panic!("boom") });

    match handle.join() {
        Err(JoinError::Failed(message)) => assert!(message.contains("boom")),
        other => panic!("expected Failed, got {other:?}"),
    }
    assert_eq!(handle.state(), TaskState::Failed);
}

#[test]
fn test_cancelled_task_yields_cancelled_error() {
    let rt = RuntimeBuilder::new().compute_threads(2).build();

    let handle = rt.spawn_result(Context::Compute, async {
        mittentis::sleep(Duration::from_secs(5)).await;
        1
    });

    // Let it reach the sleep before cancelling.
    std::thread::sleep(Duration::from_millis(50));
    handle.cancel();

    assert_eq!(handle.join(), Err(JoinError::Cancelled));
    assert_eq!(handle.state(), TaskState::Cancelled);
}

#[test]
fn test_wait_and_state_on_task_handle() {
    let rt = RuntimeBuilder::new().compute_threads(2).build();

    let state = rt.block_on(Context::Compute, async {
        let handle = task::spawn(Context::Io, async {
            mittentis::sleep(Duration::from_millis(20)).await;
        });

        handle.wait().await
    });

    assert_eq!(state, TaskState::Completed);
}

#[test]
fn test_handle_is_clonable() {
    let rt = RuntimeBuilder::new().compute_threads(2).build();

    let handle = rt.spawn(Context::Compute, async {
        mittentis::sleep(Duration::from_millis(20)).await;
    });
    let other = handle.clone();

    assert_eq!(handle.join(), TaskState::Completed);
    assert_eq!(other.state(), TaskState::Completed);
}

#[test]
fn test_values_that_are_not_clone_join_through_block_on() {
    struct Opaque(u32);

    let rt = RuntimeBuilder::new().compute_threads(2).build();

    // block_on hands the value over a channel and never clones it.
    let value = rt.block_on(Context::Compute, async { Opaque(9) });

    assert_eq!(value.0, 9);
}
