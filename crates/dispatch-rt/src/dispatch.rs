// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Driver: starts coroutines and steps them to completion.
//!
//! `dispatch` runs a job's first stretch synchronously on the caller's
//! stack, up to its first suspension. After that every resumption arrives
//! through the host's deferral queue, one step per fired completion, until
//! the coroutine finishes and the completion callback (if any) fires.
//!
//! Composition works through the same two primitives:
//! - nesting: an outer coroutine resumes when an inner dispatch finishes
//!   by handing a completer into the inner completion callback;
//! - delegation: a helper taking `&Resume<T>` mints completers and
//!   suspends on the caller's own factory.

use std::future::Future;
use std::sync::Arc;

use crate::coro::RawCoroutine;
use crate::error::DispatchError;
use crate::host::Host;
use crate::mailbox::Mailbox;
use crate::resume::Resume;

/// Starts and drives coroutines over a host's deferral queue.
///
/// Cheap to clone; clones share the host.
#[derive(Clone)]
pub struct Dispatcher {
    host: Arc<dyn Host>,
}

impl Dispatcher {
    /// Build a dispatcher owning the given host.
    pub fn new(host: impl Host + 'static) -> Self {
        Self {
            host: Arc::new(host),
        }
    }

    /// Build a dispatcher sharing an already wrapped host.
    pub fn with_host(host: Arc<dyn Host>) -> Self {
        Self { host }
    }

    /// Start a coroutine; `on_done` receives its final value.
    ///
    /// The job gets a [`Resume`] factory bound to this one instance. If
    /// the coroutine finishes without suspending, `on_done` fires before
    /// `dispatch` returns. An error the coroutine does not handle goes to
    /// [`Host::uncaught`], never to `on_done`.
    pub fn dispatch<T, R, F, Fut, C>(&self, job: F, on_done: C)
    where
        T: Send + 'static,
        R: Send + 'static,
        F: FnOnce(Resume<T>) -> Fut,
        Fut: Future<Output = Result<R, DispatchError>> + Send + 'static,
        C: FnOnce(R) + Send + 'static,
    {
        self.run(job, Some(Box::new(on_done)));
    }

    /// Start a coroutine and discard its final value.
    pub fn dispatch_detached<T, R, F, Fut>(&self, job: F)
    where
        T: Send + 'static,
        R: Send + 'static,
        F: FnOnce(Resume<T>) -> Fut,
        Fut: Future<Output = Result<R, DispatchError>> + Send + 'static,
    {
        self.run(job, None);
    }

    /// Wrap a coroutine function as an ordinary callback.
    ///
    /// Every invocation of the returned closure forwards its argument to a
    /// brand-new detached dispatch: an independent instance with its own
    /// factory state, nothing shared between invocations. Use a tuple for
    /// `A` when the callback takes several arguments.
    pub fn callback<A, T, R, F, Fut>(&self, job: F) -> impl Fn(A)
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(A, Resume<T>) -> Fut + 'static,
        Fut: Future<Output = Result<R, DispatchError>> + Send + 'static,
    {
        let dispatcher = self.clone();
        move |args: A| {
            dispatcher.dispatch_detached(|resume| job(args, resume));
        }
    }

    fn run<T, R, F, Fut>(&self, job: F, on_done: Option<Box<dyn FnOnce(R) + Send>>)
    where
        T: Send + 'static,
        R: Send + 'static,
        F: FnOnce(Resume<T>) -> Fut,
        Fut: Future<Output = Result<R, DispatchError>> + Send + 'static,
    {
        let mailbox = Arc::new(Mailbox::new());
        let resume = Resume::new(mailbox, self.host.clone());
        let future = job(resume);
        let wrapped = async move {
            match future.await {
                Ok(value) => {
                    if let Some(on_done) = on_done {
                        on_done(value);
                    }
                    None
                }
                Err(error) => Some(error),
            }
        };
        log::trace!("dispatching coroutine");
        let coro = RawCoroutine::new(Box::pin(wrapped));
        // Initial step, on the caller's stack: runs to the first
        // suspension, or straight to completion.
        coro.step(&self.host);
    }
}
