use mittentis::{Context, RuntimeBuilder, task};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[test]
fn test_block_on_returns_the_value() {
    let rt = RuntimeBuilder::new().compute_threads(2).build();

    let result = rt.block_on(Context::Compute, async { 42 });
    assert_eq!(result, 42);
}

#[test]
fn test_block_on_drains_spawned_children() {
    let rt = RuntimeBuilder::new().compute_threads(4).build();

    let child_done = Arc::new(AtomicBool::new(false));
    let done = child_done.clone();

    rt.block_on(Context::Compute, async move {
        task::spawn(Context::Io, async move {
            mittentis::sleep(Duration::from_millis(100)).await;
            done.store(true, Ordering::SeqCst);
        });
        // Return immediately; the scope still waits for the child.
    });

    assert!(child_done.load(Ordering::SeqCst));
}

#[test]
fn test_block_on_drains_grandchildren() {
    let rt = RuntimeBuilder::new().compute_threads(4).build();

    let grandchild_done = Arc::new(AtomicBool::new(false));
    let done = grandchild_done.clone();

    rt.block_on(Context::Compute, async move {
        task::spawn(Context::Compute, async move {
            task::spawn(Context::Compute, async move {
                mittentis::sleep(Duration::from_millis(100)).await;
                done.store(true, Ordering::SeqCst);
            });
        });
    });

    assert!(grandchild_done.load(Ordering::SeqCst));
}

#[test]
fn test_block_on_does_not_wait_for_independent_tasks() {
    let rt = RuntimeBuilder::new().compute_threads(4).build();

    let start = Instant::now();

    rt.block_on(Context::Compute, async {
        task::spawn_independent(Context::Io, async {
            mittentis::sleep(Duration::from_millis(500)).await;
        });
    });

    assert!(start.elapsed() < Duration::from_millis(250));
}

#[test]
fn test_block_on_nested_result_chain() {
    let rt = RuntimeBuilder::new().compute_threads(4).build();

    let result = rt.block_on(Context::Compute, async {
        let outer = task::spawn_result(Context::Compute, async {
            let inner = task::spawn_result(Context::Io, async { 10 });
            inner.await.unwrap() + 20
        });
        outer.await.unwrap() + 30
    });

    assert_eq!(result, 60);
}

#[test]
#[should_panic(expected = "blocking task failed")]
fn test_block_on_propagates_panics() {
    let rt = RuntimeBuilder::new().compute_threads(2).build();

    rt.block_on::<_, ()>(Context::Compute, async {
        panic!("exploded");
    });
}

#[test]
fn test_sequential_runtimes() {
    for n in 1..=4 {
        let rt = RuntimeBuilder::new().compute_threads(n).build();
        let result = rt.block_on(Context::Compute, async move { n * 10 });
        assert_eq!(result, n * 10);
        drop(rt);
    }
}
