// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Errors escaping a coroutine or a suspension point.

use std::any::Any;

use thiserror::Error;

/// Boxed error value carried by an injected rejection. Completers accept
/// anything convertible into this, including `&str` and `String`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An error delivered at a suspension point or escaping a coroutine.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// An error value handed to a completion (`reject`). Raised at the
    /// coroutine's pending suspension point.
    #[error("injected: {0}")]
    Injected(BoxError),

    /// Every completion for the pending suspension was dropped without
    /// firing; the resumption can never arrive.
    #[error("all resume completions dropped without firing")]
    Disconnected,

    /// The coroutine panicked while being stepped.
    #[error("coroutine panicked: {0}")]
    Panicked(String),
}

impl DispatchError {
    /// Build an `Injected` error from any error-like value.
    pub fn injected(err: impl Into<BoxError>) -> Self {
        DispatchError::Injected(err.into())
    }
}

/// Best-effort panic payload extraction, for reporting a coroutine panic
/// through `Host::uncaught`.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injected_displays_inner_message() {
        let err = DispatchError::injected("boom");
        assert_eq!(err.to_string(), "injected: boom");
    }

    #[test]
    fn panic_message_downcasts_common_payloads() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(17u8)), "unknown panic");
    }
}
