// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Deterministic reference host: a manually ticked FIFO queue.
//!
//! Deferred tasks accumulate until the owner pumps them with `tick()` or
//! `run_until_idle()`. Nothing runs between pumps, which makes coroutine
//! interleavings fully reproducible. This is the host every deterministic
//! test drives.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::host::{Deferred, Host};

/// FIFO queue of deferred tasks, pumped by hand.
pub struct TickQueue {
    tasks: Mutex<VecDeque<Deferred>>,
}

impl TickQueue {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(VecDeque::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().unwrap().is_empty()
    }

    /// Run the oldest deferred task. Returns false if the queue was empty.
    ///
    /// The task runs with the queue lock released, so it may defer more
    /// work onto this queue.
    pub fn tick(&self) -> bool {
        let task = self.tasks.lock().unwrap().pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Pump until no deferred work remains, including work deferred by the
    /// tasks themselves. Returns how many tasks ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.tick() {
            ran += 1;
        }
        ran
    }
}

impl Default for TickQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for TickQueue {
    fn defer(&self, task: Deferred) {
        self.tasks.lock().unwrap().push_back(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn defer_does_not_run_inline() {
        let queue = TickQueue::new();
        let hits = Arc::new(Mutex::new(0));
        let h = hits.clone();
        queue.defer(Box::new(move || *h.lock().unwrap() += 1));
        assert_eq!(*hits.lock().unwrap(), 0);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn tick_runs_one_task_fifo() {
        let queue = TickQueue::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let order = order.clone();
            queue.defer(Box::new(move || order.lock().unwrap().push(i)));
        }
        assert!(queue.tick());
        assert_eq!(*order.lock().unwrap(), vec![0]);
        assert!(queue.tick());
        assert!(queue.tick());
        assert!(!queue.tick());
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn run_until_idle_drains_nested_deferrals() {
        let queue = Arc::new(TickQueue::new());
        let order = Arc::new(Mutex::new(Vec::new()));
        let q = queue.clone();
        let o = order.clone();
        queue.defer(Box::new(move || {
            o.lock().unwrap().push("outer");
            let o2 = o.clone();
            q.defer(Box::new(move || o2.lock().unwrap().push("inner")));
        }));
        assert_eq!(queue.run_until_idle(), 2);
        assert_eq!(*order.lock().unwrap(), vec!["outer", "inner"]);
        assert!(queue.is_empty());
    }
}
