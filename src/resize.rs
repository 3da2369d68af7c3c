//! Resize policy shared by arrays and tables.
//!
//! Arrays grow by doubling their *current* capacity, starting from
//! [`MIN_CAPACITY`] when empty, and shrink to exact fit only on request.
//! Tables size their bucket array to `2^order` where `order` is the smallest
//! exponent with `2^order >= len` (0 for `len <= 1`); they grow during
//! insertion and shrink only on request.
//!
//! Every reservation funnels through [`reserve_exact`], which uses
//! `Vec::try_reserve_exact` so that allocation failure surfaces as
//! [`Error::AllocationFailure`] instead of aborting.

use crate::error::{Error, Result};

/// Capacity an array receives on its first growth.
pub const MIN_CAPACITY: usize = 8;

/// Next array capacity after `current`.
///
/// Returns `None` when doubling would overflow `usize`.
#[inline]
pub fn grown_capacity(current: usize) -> Option<usize> {
    if current == 0 {
        Some(MIN_CAPACITY)
    } else {
        current.checked_mul(2)
    }
}

/// Capacity reached by repeatedly applying [`grown_capacity`] to `current`
/// until it holds `needed` slots. Returns `current` when it already fits.
pub fn capacity_for(current: usize, needed: usize) -> Option<usize> {
    let mut cap = current;
    while cap < needed {
        cap = grown_capacity(cap)?;
    }
    Some(cap)
}

/// Number of buckets for a table of the given order.
#[inline]
pub fn bucket_count(order: u32) -> Option<usize> {
    1usize.checked_shl(order)
}

/// Smallest order whose bucket count holds `len` entries.
#[inline]
pub fn min_order(len: usize) -> Option<u32> {
    len.max(1)
        .checked_next_power_of_two()
        .map(|n| n.trailing_zeros())
}

/// Order a table at `current` must move to before holding `len` entries.
///
/// Grows one step at a time and never lowers the order; lowering is the
/// job of an explicit shrink.
pub fn grown_order(current: u32, len: usize) -> Option<u32> {
    let mut order = current;
    while bucket_count(order)? < len {
        order += 1;
    }
    Some(order)
}

/// Reserve room for exactly `additional` more elements in `buf`.
///
/// On failure `buf` is untouched.
pub(crate) fn reserve_exact<T>(
    buf: &mut Vec<T>,
    additional: usize,
    container: &'static str,
) -> Result<()> {
    let requested = buf.len().saturating_add(additional);

    #[cfg(any(test, feature = "failpoints"))]
    {
        if crate::failpoint::should_fail() {
            log::debug!("injected allocation failure: {container} to {requested} slots");
            return Err(Error::AllocationFailure {
                container,
                requested,
            });
        }
    }

    buf.try_reserve_exact(additional).map_err(|e| {
        log::debug!("allocation failure: {container} to {requested} slots: {e}");
        Error::AllocationFailure {
            container,
            requested,
        }
    })
}
