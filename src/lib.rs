//! rc-jsontree: a single-threaded, reference-counted JSON value tree whose
//! containers can be shrunk to exact fit, one at a time or a whole tree at
//! once.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep each piece of the container engine small enough to reason
//!   about on its own, with sizing rules that are exact and testable.
//! - Layers:
//!   - `resize`: the shared policy. Arrays grow from `MIN_CAPACITY` by
//!     doubling their current capacity; tables keep `2^order >= len` and
//!     grow one order at a time. All reservations are fallible.
//!   - `GrowableArray`: contiguous value handles with an explicit capacity
//!     and an exact-fit `shrink`.
//!   - `OrderedHashTable`: chained buckets over a `SlotMap` of entries,
//!     insertion-ordered through a linked list, rehashed on grow and on an
//!     explicit `shrink`.
//!   - `Value`: the tagged, `Rc`-counted cell; arrays and objects sit behind
//!     a `RefCell` so every handle observes in-place mutation.
//!   - `shrink_recursive`: a work-list walk applying `shrink` to every
//!     container reachable from a root.
//!
//! Constraints
//! - Single-threaded: `Value` is `!Send`/`!Sync` (it wraps `Rc`).
//! - No partial mutation: storage is reserved before anything is installed,
//!   so a failed operation leaves its container exactly as it was.
//! - No recursion proportional to tree depth: shrinking, dropping,
//!   comparing and `Debug` formatting all use explicit work-lists.
//!
//! Ownership
//! - Mutating entry points take `impl Handoff`. Passing a `Value` moves the
//!   caller's reference in (take); passing `&Value` makes the container
//!   clone it on success (borrow). A take that fails still releases the
//!   reference, so callers never clean up after a failed hand-off.
//! - A `Value` binding is its own scoped release: it is dropped exactly once
//!   when its scope ends, on every exit path.
//!
//! Notes and non-goals
//! - Cycles are not collected. A container that (transitively) holds
//!   itself leaks unless the cycle is broken by hand; `shrink_recursive`
//!   still terminates on such graphs.
//! - Parsing and serialization live outside this crate and use only the
//!   public operations.
//! - Holding an `as_array`/`as_object` borrow while mutating the same
//!   container through another handle panics, per `RefCell`. `shrink` and
//!   `shrink_recursive` report `Error::ContainerBorrowed` instead.

pub mod array;
pub mod error;
#[cfg(any(test, feature = "failpoints"))]
pub mod failpoint;
pub mod ownership;
pub mod resize;
mod shrink;
pub mod table;
mod table_proptest;
mod value;

// Public surface
pub use array::GrowableArray;
pub use error::{Error, Result};
pub use ownership::Handoff;
pub use shrink::{shrink_recursive, ShrinkStats};
pub use table::OrderedHashTable;
pub use value::{Value, ValueType};
