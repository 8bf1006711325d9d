// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Per-coroutine delivery queue.
//!
//! Every completion fired for a coroutine lands here as a tagged
//! resolution; each suspension consumes exactly one, in arrival order.
//! Tracks how many completions may still arrive so a suspension that can
//! never be resolved reports `Disconnected` instead of parking forever.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::task::{Context, Poll, Waker};

use crate::error::DispatchError;
use crate::resume::Resumed;

pub(crate) struct Mailbox<T> {
    inner: Mutex<Inner<T>>,
}

struct Inner<T> {
    queue: VecDeque<Result<Resumed<T>, DispatchError>>,
    /// Waker of the parked suspension, if any. Replaced on every poll,
    /// taken on delivery.
    waker: Option<Waker>,
    /// Resolutions that may still arrive: live unfired completers plus
    /// fired deliveries not yet pushed.
    pending: usize,
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                queue: VecDeque::new(),
                waker: None,
                pending: 0,
            }),
        }
    }

    /// A completer was minted; one more resolution may arrive.
    pub fn register(&self) {
        self.inner.lock().unwrap().pending += 1;
    }

    /// Push a fired resolution and wake the parked suspension, if any.
    pub fn deliver(&self, resolution: Result<Resumed<T>, DispatchError>) {
        let waker = {
            let mut inner = self.inner.lock().unwrap();
            inner.queue.push_back(resolution);
            inner.pending -= 1;
            inner.waker.take()
        };
        // Wake after releasing the lock.
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    /// A completer was dropped unfired; its resolution will never arrive.
    pub fn abandon(&self) {
        let waker = {
            let mut inner = self.inner.lock().unwrap();
            inner.pending -= 1;
            if inner.pending == 0 {
                // A parked suspension must learn it is unreachable.
                inner.waker.take()
            } else {
                None
            }
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    /// Take the next resolution, or park until one can arrive.
    pub fn poll_next(&self, cx: &mut Context<'_>) -> Poll<Result<Resumed<T>, DispatchError>> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(resolution) = inner.queue.pop_front() {
            return Poll::Ready(resolution);
        }
        if inner.pending == 0 {
            return Poll::Ready(Err(DispatchError::Disconnected));
        }
        inner.waker = Some(cx.waker().clone());
        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::task::Wake;

    struct FlagWaker(AtomicBool);

    impl Wake for FlagWaker {
        fn wake(self: Arc<Self>) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    fn flag_waker() -> (Arc<FlagWaker>, Waker) {
        let flag = Arc::new(FlagWaker(AtomicBool::new(false)));
        (flag.clone(), Waker::from(flag))
    }

    #[test]
    fn deliver_then_poll_is_ready() {
        let mailbox = Mailbox::new();
        mailbox.register();
        mailbox.deliver(Ok(Resumed::One(5)));
        let (_, waker) = flag_waker();
        let mut cx = Context::from_waker(&waker);
        assert!(matches!(
            mailbox.poll_next(&mut cx),
            Poll::Ready(Ok(Resumed::One(5)))
        ));
    }

    #[test]
    fn delivery_wakes_parked_poll() {
        let mailbox = Mailbox::new();
        mailbox.register();
        let (flag, waker) = flag_waker();
        let mut cx = Context::from_waker(&waker);
        assert!(mailbox.poll_next(&mut cx).is_pending());
        mailbox.deliver(Ok(Resumed::One(1)));
        assert!(flag.0.load(Ordering::SeqCst));
        assert!(matches!(
            mailbox.poll_next(&mut cx),
            Poll::Ready(Ok(Resumed::One(1)))
        ));
    }

    #[test]
    fn resolutions_pop_in_arrival_order() {
        let mailbox = Mailbox::new();
        mailbox.register();
        mailbox.register();
        mailbox.deliver(Ok(Resumed::One("first")));
        mailbox.deliver(Ok(Resumed::One("second")));
        let (_, waker) = flag_waker();
        let mut cx = Context::from_waker(&waker);
        assert!(matches!(
            mailbox.poll_next(&mut cx),
            Poll::Ready(Ok(Resumed::One("first")))
        ));
        assert!(matches!(
            mailbox.poll_next(&mut cx),
            Poll::Ready(Ok(Resumed::One("second")))
        ));
    }

    #[test]
    fn poll_without_possible_resolution_disconnects() {
        let mailbox = Mailbox::<i32>::new();
        let (_, waker) = flag_waker();
        let mut cx = Context::from_waker(&waker);
        assert!(matches!(
            mailbox.poll_next(&mut cx),
            Poll::Ready(Err(DispatchError::Disconnected))
        ));
    }

    #[test]
    fn abandon_wakes_and_disconnects() {
        let mailbox = Mailbox::<i32>::new();
        mailbox.register();
        let (flag, waker) = flag_waker();
        let mut cx = Context::from_waker(&waker);
        assert!(mailbox.poll_next(&mut cx).is_pending());
        mailbox.abandon();
        assert!(flag.0.load(Ordering::SeqCst));
        assert!(matches!(
            mailbox.poll_next(&mut cx),
            Poll::Ready(Err(DispatchError::Disconnected))
        ));
    }

    #[test]
    fn outstanding_completer_keeps_suspension_parked() {
        let mailbox = Mailbox::<i32>::new();
        mailbox.register();
        mailbox.register();
        mailbox.deliver(Ok(Resumed::One(1)));
        let (_, waker) = flag_waker();
        let mut cx = Context::from_waker(&waker);
        assert!(mailbox.poll_next(&mut cx).is_ready());
        // One completer is still live; no disconnect yet.
        assert!(mailbox.poll_next(&mut cx).is_pending());
    }
}
