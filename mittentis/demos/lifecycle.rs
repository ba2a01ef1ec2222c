//! Walkthrough of the scheduler surface: lanes, suspension, result
//! handles, cancellation, and scoped context switches.
//!
//! Run with `RUST_LOG=info cargo run --example lifecycle`.

use mittentis::{Context, task, time};

use std::time::Duration;

#[mittentis::main(compute_threads = 4)]
async fn main() {
    env_logger::init();

    contexts().await;
    suspension().await;
    builders().await;
    cancellation().await;
    tight_loop().await;
    context_switch().await;

    log::info!("lifecycle done ----> ok");
}

/// One task per lane, each reporting where it actually ran.
async fn contexts() {
    let ui = task::spawn_result(Context::Ui, async {
        task::current_context().map(|c| c.to_string())
    });
    let io = task::spawn_result(Context::Io, async {
        task::current_context().map(|c| c.to_string())
    });
    let compute = task::spawn_result(Context::Compute, async {
        task::current_context().map(|c| c.to_string())
    });

    log::info!("contexts ui lane ----> {:?}", ui.await);
    log::info!("contexts io lane ----> {:?}", io.await);
    log::info!("contexts compute lane ----> {:?}", compute.await);
}

/// Suspension points: a sleep and an explicit yield.
async fn suspension() {
    time::sleep(Duration::from_millis(100)).await;
    log::info!("suspension slept ----> 100ms");

    task::yield_now().await;
    log::info!("suspension yielded ----> ok");
}

/// The two submission modes: fire-and-forget joined through its
/// handle, and a result handle awaited twice to show memoization.
async fn builders() {
    let side = task::spawn(Context::Compute, async {
        let value = 11 * 5;
        log::info!("builders fire-and-forget ----> {value}");
    });
    side.wait().await;

    let mut result = task::spawn_result(Context::Compute, async { 23 * 5 });
    let first = (&mut result).await;
    let second = (&mut result).await;

    log::info!("builders first read ----> {first:?}");
    log::info!("builders second read ----> {second:?}");
}

/// Parent cancellation reaches owned children; an independent child
/// keeps running.
async fn cancellation() {
    let parent = task::spawn(Context::Compute, async {
        task::spawn(Context::Compute, async {
            time::sleep(Duration::from_secs(5)).await;
            log::info!("cancellation owned child finished ----> unreachable");
        });

        task::spawn_independent(Context::Compute, async {
            time::sleep(Duration::from_millis(100)).await;
            log::info!("cancellation independent child finished ----> ok");
        });

        time::sleep(Duration::from_secs(5)).await;
    });

    // Let the parent start and spawn its children.
    time::sleep(Duration::from_millis(50)).await;

    parent.cancel();
    let state = parent.wait().await;
    log::info!("cancellation parent state ----> {state:?}");

    // Give the independent child time to finish its log line.
    time::sleep(Duration::from_millis(150)).await;
}

/// A loop that never suspends runs to natural completion despite a
/// pending cancellation request; a loop that polls its token stops at
/// the next iteration.
async fn tight_loop() {
    let (started_tx, started_rx) = std::sync::mpsc::channel();

    let stubborn = task::spawn_result(Context::Compute, async move {
        let _ = started_tx.send(());

        let mut sum: u64 = 0;
        for i in 1..=1_000_000u64 {
            sum = sum.wrapping_add(i);
        }
        sum
    });

    // Cancel only once the loop is running; it still finishes.
    let _ = started_rx.recv();
    stubborn.cancel();
    log::info!("tight-loop stubborn result ----> {:?}", stubborn.await);

    let polite = task::spawn(Context::Compute, async {
        while task::is_active() {
            task::yield_now().await;
        }
        log::info!("tight-loop polite observed cancellation ----> ok");
    });
    time::sleep(Duration::from_millis(50)).await;
    polite.cancel();
    polite.wait().await;
}

/// Hop to the I/O lane for a scoped section, resume where we started.
async fn context_switch() {
    let before = task::current_context();

    let value = task::with_context(Context::Io, async {
        time::sleep(Duration::from_millis(50)).await;
        115
    })
    .await;

    let after = task::current_context();

    log::info!("context-switch value ----> {value:?}");
    log::info!("context-switch home lane ----> {:?} == {:?}", before, after);
}
