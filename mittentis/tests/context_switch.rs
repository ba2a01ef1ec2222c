use mittentis::{Context, Error, RuntimeBuilder, task};

use std::str::FromStr;

#[test]
fn test_with_context_returns_the_inner_value() {
    let rt = RuntimeBuilder::new().compute_threads(2).build();

    let value = rt.block_on(Context::Compute, async {
        task::with_context(Context::Io, async { 42 }).await
    });

    assert_eq!(value, Ok(42));
}

#[test]
fn test_with_context_runs_on_the_target_lane() {
    let rt = RuntimeBuilder::new().compute_threads(2).build();

    let inner_lane = rt.block_on(Context::Compute, async {
        task::with_context(Context::Io, async { task::current_context() }).await
    });

    assert_eq!(inner_lane, Ok(Some(Context::Io)));
}

#[test]
fn test_caller_resumes_on_its_home_lane() {
    let rt = RuntimeBuilder::new().compute_threads(2).build();

    let (before, after) = rt.block_on(Context::Compute, async {
        let before = task::current_context();
        let _ = task::with_context(Context::Ui, async { 1 }).await;
        let after = task::current_context();

        (before, after)
    });

    assert_eq!(before, Some(Context::Compute));
    assert_eq!(after, Some(Context::Compute));
}

#[test]
fn test_cancellation_propagates_into_the_switched_section() {
    let rt = RuntimeBuilder::new().compute_threads(4).build();

    let (tx, rx) = std::sync::mpsc::channel();

    let parent = rt.spawn(Context::Compute, async move {
        let _ = tx.send(());
        let _ = task::with_context(Context::Io, async {
            mittentis::sleep(std::time::Duration::from_secs(5)).await;
        })
        .await;
    });

    rx.recv().unwrap();
    std::thread::sleep(std::time::Duration::from_millis(50));

    parent.cancel();

    // Neither the caller nor the inner section keeps running.
    assert!(parent.join().is_terminal());
}

#[test]
fn test_context_lookup_by_name() {
    assert_eq!(Context::from_name("ui"), Ok(Context::Ui));
    assert_eq!(Context::from_name("IO"), Ok(Context::Io));
    assert_eq!(Context::from_name("Compute"), Ok(Context::Compute));

    assert_eq!(
        Context::from_name("disk"),
        Err(Error::UnknownContext(String::from("disk")))
    );
}

#[test]
fn test_context_from_str_and_display() {
    let ctx = Context::from_str("compute").unwrap();
    assert_eq!(ctx, Context::Compute);
    assert_eq!(ctx.to_string(), "compute");

    let err = Context::from_str("gpu").unwrap_err();
    assert_eq!(err.to_string(), "unknown execution context `gpu`");
}
