//! GrowableArray: ordered, index-addressed storage of value handles.
//!
//! Capacity is tracked explicitly so that growth and shrink follow
//! [`crate::resize`] exactly: the first growth reserves `MIN_CAPACITY`
//! slots, every later growth doubles the current capacity, and `shrink`
//! reallocates to `capacity == len`. All reallocation happens before any
//! element is installed, so a failed reservation leaves the array as it was.

use crate::error::{Error, Result};
use crate::ownership::Handoff;
use crate::resize;
use crate::value::Value;
use core::fmt;

pub struct GrowableArray {
    slots: Vec<Value>,
    capacity: usize,
}

impl GrowableArray {
    /// An empty array with no backing storage.
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            capacity: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots currently allocated.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.slots
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Value> {
        self.slots.iter()
    }

    /// Borrow the element at `index`; the reference count is not touched.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.slots.get(index)
    }

    /// Make room for `needed` elements, walking the doubling sequence.
    fn grow_to_fit(&mut self, needed: usize) -> Result<()> {
        if needed <= self.capacity {
            return Ok(());
        }
        let target =
            resize::capacity_for(self.capacity, needed).ok_or(Error::AllocationFailure {
                container: "array",
                requested: needed,
            })?;
        let additional = target - self.slots.len();
        resize::reserve_exact(&mut self.slots, additional, "array")?;
        log::trace!("array grow: capacity {} -> {}", self.capacity, target);
        self.capacity = target;
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.slots.len() {
            Ok(())
        } else {
            Err(Error::IndexOutOfRange {
                index,
                len: self.slots.len(),
            })
        }
    }

    /// Append at the end, growing first when full.
    pub fn append<H: Handoff>(&mut self, value: H) -> Result<()> {
        self.grow_to_fit(self.slots.len() + 1)?;
        self.slots.push(value.hand_off());
        Ok(())
    }

    /// Insert at `index` (which may equal `len`), shifting later elements up.
    pub fn insert<H: Handoff>(&mut self, index: usize, value: H) -> Result<()> {
        if index > self.slots.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.slots.len(),
            });
        }
        self.grow_to_fit(self.slots.len() + 1)?;
        self.slots.insert(index, value.hand_off());
        Ok(())
    }

    /// Replace the element at `index`, releasing the previous occupant.
    pub fn set<H: Handoff>(&mut self, index: usize, value: H) -> Result<()> {
        self.check_index(index)?;
        let old = core::mem::replace(&mut self.slots[index], value.hand_off());
        drop(old);
        Ok(())
    }

    /// Remove the element at `index`, releasing it and closing the gap.
    pub fn remove(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        let old = self.slots.remove(index);
        drop(old);
        Ok(())
    }

    /// Remove the last element and hand its reference to the caller.
    pub fn pop(&mut self) -> Option<Value> {
        self.slots.pop()
    }

    /// Release every element. Capacity is kept.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Append a borrowed handle to every element of `items`, in order.
    ///
    /// Growth happens once, up front, so either every element is appended
    /// or none is.
    pub fn extend_from_slice(&mut self, items: &[Value]) -> Result<()> {
        let needed = self.slots.len().checked_add(items.len()).ok_or(
            Error::AllocationFailure {
                container: "array",
                requested: usize::MAX,
            },
        )?;
        self.grow_to_fit(needed)?;
        self.slots.extend(items.iter().cloned());
        Ok(())
    }

    /// Append every element of `other`, borrowing each.
    pub fn extend(&mut self, other: &GrowableArray) -> Result<()> {
        self.extend_from_slice(other.as_slice())
    }

    /// Reallocate so that `capacity == len`.
    ///
    /// An empty array drops its storage entirely. Elements and their order
    /// are unchanged; calling it again is a no-op.
    pub fn shrink(&mut self) -> Result<()> {
        let len = self.slots.len();
        if self.capacity == len {
            return Ok(());
        }
        let mut fitted = Vec::new();
        if len > 0 {
            resize::reserve_exact(&mut fitted, len, "array")?;
        }
        fitted.append(&mut self.slots);
        log::trace!("array shrink: capacity {} -> {}", self.capacity, len);
        self.slots = fitted;
        self.capacity = len;
        Ok(())
    }

    /// Move every element into `pending`, leaving the array empty.
    pub(crate) fn detach_into(&mut self, pending: &mut Vec<Value>) {
        pending.append(&mut self.slots);
        self.slots = Vec::new();
        self.capacity = 0;
    }
}

impl Default for GrowableArray {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GrowableArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.slots.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a GrowableArray {
    type Item = &'a Value;
    type IntoIter = core::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}
