// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Cooperative coroutine dispatch over a pluggable deferral host.
//!
//! A job is an async function handed a [`Resume`] factory. Each completer
//! minted from the factory is a single-use completion; firing one delivers
//! its resolution through the host's deferral queue and resumes the
//! coroutine by exactly one step. Completion callbacks see final values
//! only; errors the coroutine does not handle surface at the host.
//!
//! Components:
//! - [`Dispatcher`]: starts coroutines, adapts them to plain callbacks
//! - [`Resume`] / [`Completer`]: suspension points and their completions
//! - [`Host`]: where deferrals and uncaught errors go
//! - [`TickQueue`] / [`ThreadPump`]: ready-made hosts for tests and
//!   thread-based embedders

mod coro;
pub mod dispatch;
pub mod error;
pub mod host;
mod mailbox;
pub mod pump;
pub mod queue;
pub mod resume;

pub use dispatch::Dispatcher;
pub use error::{BoxError, DispatchError};
pub use host::{Deferred, Host};
pub use pump::ThreadPump;
pub use queue::TickQueue;
pub use resume::{Completer, Resume, Resumed, Suspend};
