//! Take-or-borrow hand-off of values into containers.
//!
//! Every mutating container entry point is generic over [`Handoff`]:
//! - passing a `Value` is the *take* form: the caller's handle moves into
//!   the call. If the call fails the handle is dropped inside it, so the
//!   reference is released on every path and the caller never cleans up.
//! - passing a `&Value` is the *borrow* form: the container clones the
//!   handle (incrementing the count) only at the moment it installs it. A
//!   failed call leaves the count exactly where it was.
//!
//! Release on scope exit is `Value`'s `Drop`. A binding holding a `Value`
//! gives up its reference exactly once however the scope is left, including
//! `?` early returns.

use crate::value::Value;

/// A value that can be handed to a container, by move or by reference.
pub trait Handoff {
    /// Produce the handle the container will store.
    ///
    /// Containers call this only after every fallible step has succeeded.
    fn hand_off(self) -> Value;
}

impl Handoff for Value {
    #[inline]
    fn hand_off(self) -> Value {
        self
    }
}

impl Handoff for &Value {
    #[inline]
    fn hand_off(self) -> Value {
        self.clone()
    }
}
