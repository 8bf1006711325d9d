// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Host seam: the injected "defer to next tick" primitive.
//!
//! The driver never runs an event loop of its own. Every deferral, be it
//! a resumption delivery or a wake, goes through a [`Host`], supplied
//! once when the [`Dispatcher`](crate::dispatch::Dispatcher) is built. Two
//! reference hosts ship with the crate: [`TickQueue`](crate::queue::TickQueue)
//! (manually ticked, deterministic) and [`ThreadPump`](crate::pump::ThreadPump)
//! (background pump thread).

use crate::error::DispatchError;

/// A unit of deferred work.
pub type Deferred = Box<dyn FnOnce() + Send>;

/// The host runtime the driver schedules through.
pub trait Host: Send + Sync {
    /// Schedule `task` to run after the current call stack unwinds.
    ///
    /// Tasks must run asynchronously with respect to the caller and in
    /// FIFO order relative to other deferrals on the same host.
    fn defer(&self, task: Deferred);

    /// Called when an error escapes a coroutine that nothing handles.
    ///
    /// Runs from the deferred step that observed the failure. The
    /// completion callback of the affected dispatch never fires.
    fn uncaught(&self, error: DispatchError) {
        log::error!("uncaught coroutine error: {error}");
    }
}
