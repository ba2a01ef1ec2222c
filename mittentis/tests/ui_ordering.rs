use mittentis::{Context, RuntimeBuilder, task};

use std::sync::{Arc, Mutex};

#[test]
fn test_ui_completion_order_matches_submission_order() {
    let rt = RuntimeBuilder::new().compute_threads(2).build();

    let order = Arc::new(Mutex::new(Vec::new()));
    let order_clone = order.clone();

    rt.block_on(Context::Compute, async move {
        let handles: Vec<_> = (0..20)
            .map(|i| {
                let order = order_clone.clone();
                task::spawn(Context::Ui, async move {
                    order.lock().unwrap().push(i);
                })
            })
            .collect();

        for handle in handles {
            handle.wait().await;
        }
    });

    let recorded = order.lock().unwrap();
    assert_eq!(*recorded, (0..20).collect::<Vec<_>>());
}

#[test]
fn test_ui_lane_is_a_single_thread() {
    let rt = RuntimeBuilder::new().compute_threads(2).build();

    let (first, second) = rt.block_on(Context::Compute, async {
        let a = task::spawn_result(Context::Ui, async {
            std::thread::current().name().map(String::from)
        });
        let b = task::spawn_result(Context::Ui, async {
            std::thread::current().name().map(String::from)
        });

        (a.await.unwrap(), b.await.unwrap())
    });

    assert!(first.is_some());
    assert_eq!(first, second);
}

#[test]
fn test_ui_tasks_report_their_lane() {
    let rt = RuntimeBuilder::new().compute_threads(2).build();

    let lane = rt.block_on(Context::Compute, async {
        task::spawn_result(Context::Ui, async { task::current_context() })
            .await
            .unwrap()
    });

    assert_eq!(lane, Some(Context::Ui));
}

#[test]
fn test_ui_order_preserved_across_yields() {
    let rt = RuntimeBuilder::new().compute_threads(2).build();

    let order = Arc::new(Mutex::new(Vec::new()));
    let order_clone = order.clone();

    rt.block_on(Context::Compute, async move {
        let handles: Vec<_> = (0..5)
            .map(|i| {
                let order = order_clone.clone();
                task::spawn(Context::Ui, async move {
                    // Yielding sends the task to the back of the FIFO
                    // queue; the rotation keeps submission order.
                    task::yield_now().await;
                    order.lock().unwrap().push(i);
                })
            })
            .collect();

        for handle in handles {
            handle.wait().await;
        }
    });

    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
}
