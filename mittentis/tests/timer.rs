use mittentis::{Context, RuntimeBuilder, join, task, time};

use std::time::{Duration, Instant};

#[test]
fn test_sleep_waits_at_least_the_duration() {
    let rt = RuntimeBuilder::new().compute_threads(2).build();

    let elapsed = rt.block_on(Context::Compute, async {
        let start = Instant::now();
        time::sleep(Duration::from_millis(50)).await;
        start.elapsed()
    });

    assert!(elapsed >= Duration::from_millis(50));
}

#[test]
fn test_sleeping_tasks_do_not_hold_a_worker() {
    // One compute worker, three concurrent sleeps: they must overlap.
    let rt = RuntimeBuilder::new().compute_threads(1).build();

    let start = Instant::now();

    rt.block_on(Context::Compute, async {
        let handles: Vec<_> = (0..3)
            .map(|_| {
                task::spawn(Context::Compute, async {
                    time::sleep(Duration::from_millis(100)).await;
                })
            })
            .collect();

        for handle in handles {
            handle.wait().await;
        }
    });

    assert!(start.elapsed() < Duration::from_millis(250));
}

#[test]
fn test_join_runs_futures_concurrently() {
    let rt = RuntimeBuilder::new().compute_threads(2).build();

    let start = Instant::now();

    let (a, b) = rt.block_on(Context::Compute, async {
        join!(
            async {
                time::sleep(Duration::from_millis(100)).await;
                10
            },
            async {
                time::sleep(Duration::from_millis(100)).await;
                20
            }
        )
    });

    assert_eq!((a, b), (10, 20));
    assert!(start.elapsed() < Duration::from_millis(190));
}

#[mittentis::test]
async fn test_sleep_inside_macro_test() {
    let start = Instant::now();
    time::sleep(Duration::from_millis(30)).await;
    assert!(start.elapsed() >= Duration::from_millis(30));
}

#[mittentis::test]
async fn test_yield_now_comes_back() {
    let mut turns = 0;
    while turns < 10 {
        task::yield_now().await;
        turns += 1;
    }
    assert_eq!(turns, 10);
}
