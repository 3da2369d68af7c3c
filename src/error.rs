//! Error types for container operations.

use thiserror::Error;

/// Failure reported by array, table and value operations.
///
/// Take-form operations consume their argument even when they return one of
/// these; the container itself is always left exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Backing storage could not be grown, shrunk or rehashed.
    #[error("allocation failed resizing {container} storage to {requested} slots")]
    AllocationFailure {
        /// Which container kind was being resized ("array" or "object").
        container: &'static str,
        /// Slot or bucket count that was requested.
        requested: usize,
    },

    /// Lookup or deletion of a key that is not present.
    #[error("key not found: {key:?}")]
    KeyNotFound {
        /// The missing key.
        key: String,
    },

    /// Index-based access past the end of an array.
    #[error("index {index} out of range (length={len})")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Array length at the time of the call.
        len: usize,
    },

    /// An operation was applied to a value of the wrong variant.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Variant the operation requires.
        expected: &'static str,
        /// Variant the value actually holds.
        found: &'static str,
    },

    /// A container could not be modified because a borrow of it obtained
    /// through `as_array`/`as_object` is still alive.
    #[error("{container} is already borrowed")]
    ContainerBorrowed {
        /// Which container kind was busy ("array" or "object").
        container: &'static str,
    },
}

/// Result type alias for container operations.
pub type Result<T> = std::result::Result<T, Error>;
