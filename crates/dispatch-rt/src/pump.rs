// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Thread-backed reference host: a background pump executing deferrals.
//!
//! A channel feeds one pump thread that runs deferred tasks in arrival
//! order. Suits real-time tests and demos where completions fire from
//! timer or worker threads. Dropping the pump closes the channel, drains
//! what was already queued, and joins the thread.

use std::sync::mpsc;
use std::sync::Mutex;
use std::thread::{self, JoinHandle};

use crate::host::{Deferred, Host};

/// Host that pumps deferred tasks on a dedicated thread.
pub struct ThreadPump {
    sender: Mutex<Option<mpsc::Sender<Deferred>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ThreadPump {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel::<Deferred>();
        let worker = thread::spawn(move || {
            // Err means every sender is gone and the queue is drained.
            while let Ok(task) = rx.recv() {
                task();
            }
        });
        Self {
            sender: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        }
    }
}

impl Default for ThreadPump {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for ThreadPump {
    fn defer(&self, task: Deferred) {
        let sender = self.sender.lock().unwrap();
        let delivered = match sender.as_ref() {
            Some(tx) => tx.send(task).is_ok(),
            None => false,
        };
        if !delivered {
            log::warn!("deferral dropped: pump is shut down");
        }
    }
}

impl Drop for ThreadPump {
    fn drop(&mut self) {
        // Closing the channel ends the pump loop once queued tasks drain.
        drop(self.sender.lock().unwrap().take());
        let worker = self.worker.lock().unwrap().take();
        if let Some(handle) = worker {
            // A deferred task may own the last reference to this pump;
            // the pump thread must not join itself.
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn runs_tasks_in_submission_order() {
        let pump = ThreadPump::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let (done_tx, done_rx) = mpsc::channel();
        for i in 0..10 {
            let order = order.clone();
            pump.defer(Box::new(move || order.lock().unwrap().push(i)));
        }
        pump.defer(Box::new(move || done_tx.send(()).unwrap()));
        done_rx.recv().unwrap();
        assert_eq!(*order.lock().unwrap(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn tasks_run_off_the_caller_thread() {
        let pump = ThreadPump::new();
        let (tx, rx) = mpsc::channel();
        pump.defer(Box::new(move || tx.send(thread::current().id()).unwrap()));
        let pump_thread = rx.recv().unwrap();
        assert_ne!(pump_thread, thread::current().id());
    }

    #[test]
    fn drop_drains_queued_tasks() {
        let pump = ThreadPump::new();
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        pump.defer(Box::new(move || {
            thread::sleep(Duration::from_millis(20));
            flag.store(true, Ordering::Release);
        }));
        drop(pump);
        assert!(ran.load(Ordering::Acquire));
    }
}
