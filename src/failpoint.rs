//! Allocation fault injection.
//!
//! A per-thread countdown consulted by every fallible reservation in
//! [`crate::resize`]. Once armed with `n`, the n-th subsequent reservation
//! (0 = the very next one) reports `AllocationFailure` without touching the
//! allocator, and the countdown disarms itself. Tests run on their own
//! threads, so arming never leaks into a neighbouring test.

use core::cell::Cell;
use core::marker::PhantomData;

thread_local! {
    static COUNTDOWN: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Arms the injector; the returned guard disarms it when dropped.
///
/// ```ignore
/// let _armed = failpoint::fail_nth_allocation(0);
/// assert!(array.append(Value::null()).is_err());
/// ```
pub fn fail_nth_allocation(n: usize) -> Armed {
    COUNTDOWN.with(|c| c.set(Some(n)));
    Armed {
        _nosend: PhantomData,
    }
}

/// Disarms the injector on this thread.
pub fn disarm() {
    COUNTDOWN.with(|c| c.set(None));
}

/// True while a failure is still pending on this thread.
pub fn is_armed() -> bool {
    COUNTDOWN.with(|c| c.get().is_some())
}

/// Consumes one step of the countdown; true when this reservation must fail.
pub(crate) fn should_fail() -> bool {
    COUNTDOWN.with(|c| match c.get() {
        None => false,
        Some(0) => {
            c.set(None);
            true
        }
        Some(n) => {
            c.set(Some(n - 1));
            false
        }
    })
}

/// RAII guard returned by [`fail_nth_allocation`].
#[must_use = "the injector disarms as soon as the guard is dropped"]
pub struct Armed {
    // The countdown is thread-local; keep the guard on its thread.
    _nosend: PhantomData<*mut ()>,
}

impl Drop for Armed {
    fn drop(&mut self) {
        disarm();
    }
}
