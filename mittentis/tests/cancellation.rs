use mittentis::{Context, JoinError, RuntimeBuilder, TaskState, task};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::time::Duration;

#[test]
fn test_cancelling_parent_cancels_children() {
    let rt = RuntimeBuilder::new().compute_threads(4).build();

    let child_a_done = Arc::new(AtomicBool::new(false));
    let child_b_done = Arc::new(AtomicBool::new(false));
    let a = child_a_done.clone();
    let b = child_b_done.clone();

    let (tx, rx) = mpsc::channel();

    let parent = rt.spawn(Context::Compute, async move {
        let ha = task::spawn(Context::Compute, async move {
            mittentis::sleep(Duration::from_secs(5)).await;
            a.store(true, Ordering::SeqCst);
        });
        let hb = task::spawn(Context::Io, async move {
            mittentis::sleep(Duration::from_secs(5)).await;
            b.store(true, Ordering::SeqCst);
        });

        let _ = tx.send((ha, hb));
        mittentis::sleep(Duration::from_secs(5)).await;
    });

    let (child_a, child_b) = rx.recv().unwrap();

    // Let all three reach their sleeps.
    std::thread::sleep(Duration::from_millis(100));

    parent.cancel();

    assert_eq!(parent.join(), TaskState::Cancelled);
    assert_eq!(child_a.join(), TaskState::Cancelled);
    assert_eq!(child_b.join(), TaskState::Cancelled);
    assert!(!child_a_done.load(Ordering::SeqCst));
    assert!(!child_b_done.load(Ordering::SeqCst));
}

#[test]
fn test_independent_child_survives_parent_cancellation() {
    let rt = RuntimeBuilder::new().compute_threads(4).build();

    let independent_done = Arc::new(AtomicBool::new(false));
    let done = independent_done.clone();

    let (tx, rx) = mpsc::channel();

    let parent = rt.spawn(Context::Compute, async move {
        let h = task::spawn_independent(Context::Compute, async move {
            mittentis::sleep(Duration::from_millis(100)).await;
            done.store(true, Ordering::SeqCst);
        });

        let _ = tx.send(h);
        mittentis::sleep(Duration::from_secs(5)).await;
    });

    let independent = rx.recv().unwrap();

    parent.cancel();
    assert_eq!(parent.join(), TaskState::Cancelled);

    assert_eq!(independent.join(), TaskState::Completed);
    assert!(independent_done.load(Ordering::SeqCst));
}

#[test]
fn test_tight_loop_runs_to_natural_completion() {
    let rt = RuntimeBuilder::new().compute_threads(4).build();

    let (started_tx, started_rx) = mpsc::channel();

    let handle = rt.spawn_result(Context::Compute, async move {
        let _ = started_tx.send(());

        let mut sum: u64 = 0;
        for i in 1..=100_000u64 {
            sum = sum.wrapping_add(i);
        }
        sum
    });

    // Cancel while the loop is running; it never polls its token and
    // never suspends, so it finishes anyway.
    started_rx.recv().unwrap();
    handle.cancel();

    assert_eq!(handle.join(), Ok(100_000 * 100_001 / 2));
    assert_eq!(handle.state(), TaskState::Completed);
}

#[test]
fn test_cancel_before_first_poll() {
    let rt = RuntimeBuilder::new().compute_threads(2).build();

    let ran = Arc::new(AtomicBool::new(false));
    let flag = ran.clone();

    // Occupy the single UI worker so the next submission stays queued.
    let blocker = rt.spawn(Context::Ui, async {
        std::thread::sleep(Duration::from_millis(200));
    });

    let queued = rt.spawn_result(Context::Ui, async move {
        flag.store(true, Ordering::SeqCst);
        5
    });

    queued.cancel();

    assert_eq!(queued.join(), Err(JoinError::Cancelled));
    assert_eq!(queued.state(), TaskState::Cancelled);

    blocker.join();
    assert!(!ran.load(Ordering::SeqCst));
}

#[test]
fn test_loop_polling_its_token_stops() {
    let rt = RuntimeBuilder::new().compute_threads(4).build();

    let (started_tx, started_rx) = mpsc::channel();

    let handle = rt.spawn(Context::Compute, async move {
        let _ = started_tx.send(());

        while task::is_active() {
            task::yield_now().await;
        }
    });

    started_rx.recv().unwrap();
    handle.cancel();

    // The loop stops promptly: either the scheduler cancels the task
    // at the yield, or the body sees the flag and returns normally.
    let state = handle.join();
    assert!(matches!(state, TaskState::Cancelled | TaskState::Completed));
}

#[test]
fn test_cancelling_a_finished_task_is_a_noop() {
    let rt = RuntimeBuilder::new().compute_threads(2).build();

    let handle = rt.spawn_result(Context::Compute, async { 7 });
    assert_eq!(handle.join(), Ok(7));

    handle.cancel();
    assert_eq!(handle.state(), TaskState::Completed);
    assert_eq!(handle.join(), Ok(7));
}

#[test]
fn test_cancel_token_reaches_blocking_sections() {
    let rt = RuntimeBuilder::new().compute_threads(4).build();

    let (token_tx, token_rx) = mpsc::channel();

    let handle = rt.spawn(Context::Io, async move {
        let token = task::cancel_token().unwrap();
        let _ = token_tx.send(token.clone());

        while token.is_active() {
            std::thread::sleep(Duration::from_millis(5));
        }
    });

    let token = token_rx.recv().unwrap();
    assert!(token.is_active());

    handle.cancel();
    assert!(token.is_cancelled());

    // The body observes the flag and returns normally.
    assert_eq!(handle.join(), TaskState::Completed);
}
