// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Coroutine cell: type-erased future slot plus the step procedure.
//!
//! One cell per dispatch. A step is a single poll; wakes re-queue a step
//! through the host rather than polling inline, so a coroutine never runs
//! on the stack that woke it.

use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Wake, Waker};

use crate::error::{panic_message, DispatchError};
use crate::host::Host;

/// Type-erased coroutine future. Yields the error that escaped, if any;
/// the typed final value is consumed by the wrapper before erasure.
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Option<DispatchError>> + Send>>;

pub(crate) struct RawCoroutine {
    /// The wrapped job future. None once the coroutine completed.
    future: Mutex<Option<BoxFuture>>,
    /// Set while a wake-triggered step sits in the host queue.
    queued: AtomicBool,
}

impl RawCoroutine {
    pub fn new(future: BoxFuture) -> Arc<Self> {
        Arc::new(Self {
            future: Mutex::new(Some(future)),
            queued: AtomicBool::new(false),
        })
    }

    /// Poll the coroutine once. Completion or a panic clears the slot;
    /// an error nothing handled is routed to `Host::uncaught`.
    pub fn step(self: &Arc<Self>, host: &Arc<dyn Host>) {
        self.queued.store(false, Ordering::Release);
        let waker = step_waker(self.clone(), host.clone());
        let mut cx = Context::from_waker(&waker);

        let mut slot = self.future.lock().unwrap();
        let Some(future) = slot.as_mut() else {
            // Completed earlier; stale wake.
            return;
        };

        let polled = catch_unwind(AssertUnwindSafe(|| future.as_mut().poll(&mut cx)));
        let escaped = match polled {
            Ok(Poll::Ready(escaped)) => {
                log::trace!("coroutine finished");
                *slot = None;
                escaped
            }
            Ok(Poll::Pending) => None,
            Err(payload) => {
                *slot = None;
                Some(DispatchError::Panicked(panic_message(payload)))
            }
        };
        drop(slot);

        if let Some(error) = escaped {
            host.uncaught(error);
        }
    }
}

/// Waker that re-queues a step through the host.
struct StepWaker {
    coro: Arc<RawCoroutine>,
    host: Arc<dyn Host>,
}

impl Wake for StepWaker {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        if self.coro.queued.swap(true, Ordering::AcqRel) {
            return; // A step is already queued.
        }
        let coro = self.coro.clone();
        let host = self.host.clone();
        self.host.defer(Box::new(move || coro.step(&host)));
    }
}

fn step_waker(coro: Arc<RawCoroutine>, host: Arc<dyn Host>) -> Waker {
    Waker::from(Arc::new(StepWaker { coro, host }))
}
