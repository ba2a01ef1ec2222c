use mittentis::{Context, RuntimeBuilder, TaskState};

use std::sync::{Arc, Mutex};

// The failure hook is process-wide, so this file holds a single test.
#[test]
fn test_fire_and_forget_failures_reach_the_hook() {
    let messages = Arc::new(Mutex::new(Vec::new()));
    let sink = messages.clone();

    mittentis::set_failure_hook(move |message| {
        sink.lock().unwrap().push(message.to_string());
    });

    let rt = RuntimeBuilder::new().compute_threads(2).build();

    let handle = rt.spawn(Context::Compute, async {
        panic!("kaboom");
    });

    assert_eq!(handle.join(), TaskState::Failed);

    let seen = messages.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].contains("kaboom"));
}
