// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Resume-token factory: suspension points and single-use completions.
//!
//! Each coroutine receives one [`Resume`] handle. `completer()` mints a
//! single-use [`Completer`] to hand to an external async operation;
//! `suspend()` parks the coroutine until one fired completion arrives.
//! Firing never resumes the coroutine on the firing caller's stack; the
//! resolution is deferred through the host.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::error::{BoxError, DispatchError};
use crate::host::Host;
use crate::mailbox::Mailbox;

/// A resolution delivered to a suspension point: one value, or an ordered
/// sequence when the operation completed with several.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resumed<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Resumed<T> {
    /// The single value, if this resolution carried exactly one.
    pub fn one(self) -> Option<T> {
        match self {
            Resumed::One(value) => Some(value),
            Resumed::Many(_) => None,
        }
    }

    /// The carried values, single or sequence, as a vector.
    pub fn into_values(self) -> Vec<T> {
        match self {
            Resumed::One(value) => vec![value],
            Resumed::Many(values) => values,
        }
    }
}

/// The token factory bound to one coroutine.
///
/// Not cloneable and moved into the coroutine, so completions minted here
/// can never resume a different coroutine.
pub struct Resume<T> {
    mailbox: Arc<Mailbox<T>>,
    host: Arc<dyn Host>,
}

impl<T: Send + 'static> Resume<T> {
    pub(crate) fn new(mailbox: Arc<Mailbox<T>>, host: Arc<dyn Host>) -> Self {
        Self { mailbox, host }
    }

    /// Mint a fresh single-use completion for one async operation.
    pub fn completer(&self) -> Completer<T> {
        self.mailbox.register();
        Completer {
            mailbox: self.mailbox.clone(),
            host: self.host.clone(),
            fired: AtomicBool::new(false),
        }
    }

    /// Suspend until the next fired completion arrives.
    ///
    /// Resolutions are consumed one per suspension, in the order the
    /// underlying operations completed, not the order their completers
    /// were minted. A rejected completion resolves the suspension with
    /// `Err(Injected)`; if every completer for this suspension is dropped
    /// unfired, it resolves with `Err(Disconnected)`.
    pub fn suspend(&self) -> Suspend<'_, T> {
        Suspend {
            mailbox: &self.mailbox,
        }
    }
}

/// Single-use completion function handed to an external async operation.
///
/// May be fired from any thread. Firing defers the resumption through the
/// host; it never runs the coroutine synchronously. Firing twice panics.
/// Dropping an unfired completer gives up its resumption (see
/// [`DispatchError::Disconnected`]).
pub struct Completer<T> {
    mailbox: Arc<Mailbox<T>>,
    host: Arc<dyn Host>,
    fired: AtomicBool,
}

impl<T: Send + 'static> Completer<T> {
    /// Complete with a single value.
    pub fn resolve(&self, value: T) {
        self.fire(Ok(Resumed::One(value)));
    }

    /// Complete with an ordered sequence of values.
    pub fn resolve_many(&self, values: Vec<T>) {
        self.fire(Ok(Resumed::Many(values)));
    }

    /// Complete with an error, raised at the pending suspension point.
    pub fn reject(&self, error: impl Into<BoxError>) {
        self.fire(Err(DispatchError::Injected(error.into())));
    }

    /// Complete with an explicit tagged resolution.
    pub fn complete(&self, resolution: Result<Resumed<T>, DispatchError>) {
        self.fire(resolution);
    }

    fn fire(&self, resolution: Result<Resumed<T>, DispatchError>) {
        if self.fired.swap(true, Ordering::AcqRel) {
            panic!("resume completion fired more than once");
        }
        log::trace!("resume completion fired");
        let mailbox = self.mailbox.clone();
        self.host
            .defer(Box::new(move || mailbox.deliver(resolution)));
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if !self.fired.load(Ordering::Acquire) {
            log::trace!("resume completion dropped unfired");
            self.mailbox.abandon();
        }
    }
}

/// Future returned by [`Resume::suspend`].
pub struct Suspend<'a, T> {
    mailbox: &'a Mailbox<T>,
}

impl<T> Future for Suspend<'_, T> {
    type Output = Result<Resumed<T>, DispatchError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.mailbox.poll_next(cx)
    }
}
