//! The timer thread.
//!
//! One dedicated thread owns a min-heap of deadlines and serves every
//! lane. Registrations arrive over a channel; the thread sleeps until
//! the earliest deadline or the next command, whichever comes first,
//! and wakes the tasks whose deadlines have passed.

pub(crate) mod entry;

use entry::TimerEntry;

use std::collections::BinaryHeap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::task::Waker;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Commands accepted by the timer thread.
pub(crate) enum Command {
    /// Register a new deadline.
    Register(TimerEntry),
    /// Stop the timer thread. Pending deadlines are dropped.
    Shutdown,
}

/// Client side of the timer thread.
#[derive(Clone)]
pub(crate) struct TimerHandle {
    tx: Sender<Command>,
}

impl TimerHandle {
    /// Registers `waker` to be woken once `deadline` passes, unless
    /// `cancelled` is raised first.
    ///
    /// If the timer thread is gone the waker fires immediately, so the
    /// registering task re-polls instead of hanging.
    pub(crate) fn register(&self, deadline: Instant, waker: Waker, cancelled: Arc<AtomicBool>) {
        let entry = TimerEntry {
            deadline,
            waker,
            cancelled,
        };

        if let Err(failed) = self.tx.send(Command::Register(entry)) {
            if let Command::Register(entry) = failed.0 {
                entry.waker.wake();
            }
        }
    }

    /// Asks the timer thread to stop.
    pub(crate) fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown);
    }
}

/// The timer event loop state.
pub(crate) struct Timer {
    rx: Receiver<Command>,
    heap: BinaryHeap<TimerEntry>,
}

impl Timer {
    /// Starts the timer thread.
    pub(crate) fn start() -> (TimerHandle, JoinHandle<()>) {
        let (tx, rx) = channel();

        let handle = thread::Builder::new()
            .name(String::from("mittentis-timer"))
            .spawn(move || {
                let mut timer = Timer {
                    rx,
                    heap: BinaryHeap::new(),
                };
                timer.run();
            })
            .expect("failed to spawn timer thread");

        (TimerHandle { tx }, handle)
    }

    /// Runs until a `Shutdown` command arrives or every sender is gone.
    fn run(&mut self) {
        log::trace!("timer started");

        loop {
            self.fire_due();

            let command = match self.heap.peek() {
                None => match self.rx.recv() {
                    Ok(command) => command,
                    Err(_) => break,
                },
                Some(next) => {
                    let timeout = next.deadline.saturating_duration_since(Instant::now());

                    match self.rx.recv_timeout(timeout) {
                        Ok(command) => command,
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            };

            match command {
                Command::Register(entry) => self.heap.push(entry),
                Command::Shutdown => break,
            }
        }

        log::trace!("timer stopped");
    }

    /// Wakes every entry whose deadline has passed.
    fn fire_due(&mut self) {
        let now = Instant::now();

        while let Some(next) = self.heap.peek() {
            if next.deadline > now {
                break;
            }

            if let Some(entry) = self.heap.pop()
                && !entry.cancelled.load(Ordering::Acquire)
            {
                entry.waker.wake();
            }
        }
    }
}
