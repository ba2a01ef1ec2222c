use mittentis::{Context, RuntimeBuilder, TaskState, task};

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[test]
fn test_compute_pool_stress() {
    let rt = RuntimeBuilder::new().compute_threads(8).build();

    let counter = Arc::new(AtomicUsize::new(0));
    let counter_clone = counter.clone();

    rt.block_on(Context::Compute, async move {
        let handles: Vec<_> = (0..100)
            .map(|_| {
                let counter = counter_clone.clone();
                task::spawn(Context::Compute, async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();

        for handle in handles {
            handle.wait().await;
        }
    });

    assert_eq!(counter.load(Ordering::SeqCst), 100);
}

#[test]
fn test_elastic_io_pool_grows_under_blocking_load() {
    let rt = RuntimeBuilder::new()
        .compute_threads(2)
        .io_max_threads(16)
        .build();

    let start = Instant::now();

    rt.block_on(Context::Compute, async {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                task::spawn(Context::Io, async {
                    // Deliberately blocking: the lane must grow to keep
                    // the other submissions from queueing behind it.
                    std::thread::sleep(Duration::from_millis(100));
                })
            })
            .collect();

        for handle in handles {
            handle.wait().await;
        }
    });

    // Serialized on one worker this would take 800ms.
    assert!(
        start.elapsed() < Duration::from_millis(450),
        "io pool did not grow: {:?}",
        start.elapsed()
    );
}

#[test]
fn test_io_pool_respects_its_cap() {
    let rt = RuntimeBuilder::new()
        .compute_threads(2)
        .io_max_threads(2)
        .build();

    let start = Instant::now();

    rt.block_on(Context::Compute, async {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                task::spawn(Context::Io, async {
                    std::thread::sleep(Duration::from_millis(100));
                })
            })
            .collect();

        for handle in handles {
            handle.wait().await;
        }
    });

    // Four blocking tasks over at most two workers need two rounds.
    assert!(start.elapsed() >= Duration::from_millis(190));
}

#[test]
fn test_spawn_after_shutdown_yields_a_cancelled_handle() {
    let rt = RuntimeBuilder::new().compute_threads(2).build();
    rt.shutdown();

    let ran = Arc::new(AtomicBool::new(false));
    let flag = ran.clone();

    let handle = rt.spawn(Context::Compute, async move {
        flag.store(true, Ordering::SeqCst);
    });

    assert_eq!(handle.state(), TaskState::Cancelled);

    std::thread::sleep(Duration::from_millis(50));
    assert!(!ran.load(Ordering::SeqCst));
}

#[test]
fn test_shutdown_cancels_outstanding_tasks() {
    let rt = RuntimeBuilder::new().compute_threads(2).build();

    let handle = rt.spawn(Context::Io, async {
        mittentis::sleep(Duration::from_secs(60)).await;
    });

    std::thread::sleep(Duration::from_millis(50));
    rt.shutdown();

    assert_eq!(handle.state(), TaskState::Cancelled);
}

#[test]
#[should_panic(expected = "compute lane requires at least one worker")]
fn test_zero_compute_threads_panics() {
    let _ = RuntimeBuilder::new().compute_threads(0).build();
}

#[test]
#[should_panic(expected = "io lane requires at least one worker")]
fn test_zero_io_threads_panics() {
    let _ = RuntimeBuilder::new().io_max_threads(0).build();
}

#[test]
fn test_lanes_are_isolated() {
    let rt = RuntimeBuilder::new().compute_threads(2).build();

    // A blocked UI worker must not stall the other lanes.
    let blocker = rt.spawn(Context::Ui, async {
        std::thread::sleep(Duration::from_millis(200));
    });

    let value = rt.block_on(Context::Compute, async { 5 });
    assert_eq!(value, 5);

    blocker.join();
}
