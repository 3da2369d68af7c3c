//! Recursive exact-fit shrink over a value tree.
//!
//! The walk keeps its own stack of pending containers instead of recursing,
//! so arbitrarily deep trees are bounded by heap rather than call stack.
//! Arrays are visited in index order and objects in insertion order.
//!
//! A container reachable through several paths (a shared subtree) is shrunk
//! once; the visited set also makes the walk terminate on cyclic graphs,
//! even though such graphs are never collected.
//!
//! The walk stops at the first failure, including a container that is still
//! borrowed through `as_array`/`as_object`. Containers already shrunk stay
//! shrunk; nothing is rolled back.

use crate::error::{Error, Result};
use crate::value::{Kind, Value};
use hashbrown::HashSet;

/// Summary of a completed `shrink_recursive` pass.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ShrinkStats {
    /// Arrays whose storage was brought to exact fit.
    pub arrays: usize,
    /// Objects whose bucket array was brought to minimal order.
    pub objects: usize,
}

impl ShrinkStats {
    pub fn containers(&self) -> usize {
        self.arrays + self.objects
    }
}

/// Shrink `root` and every array and object reachable from it.
///
/// Scalars are a no-op.
pub fn shrink_recursive(root: &Value) -> Result<ShrinkStats> {
    let mut stats = ShrinkStats::default();
    if !root.is_container() {
        return Ok(stats);
    }

    let mut visited: HashSet<*const ()> = HashSet::new();
    let mut pending = vec![root.clone()];
    while let Some(value) = pending.pop() {
        if !visited.insert(value.addr()) {
            continue;
        }
        if let Err(e) = shrink_one(&value, &mut pending, &mut stats) {
            log::debug!(
                "shrink_recursive stopped after {} containers: {e}",
                stats.containers()
            );
            return Err(e);
        }
    }
    log::debug!(
        "shrink_recursive: {} arrays, {} objects",
        stats.arrays,
        stats.objects
    );
    Ok(stats)
}

/// Shrink a single container and queue its container children.
fn shrink_one(value: &Value, pending: &mut Vec<Value>, stats: &mut ShrinkStats) -> Result<()> {
    // Children are pushed in reverse so they pop in traversal order.
    let start = pending.len();
    match value.kind() {
        Kind::Array(cell) => {
            let mut array = cell
                .try_borrow_mut()
                .map_err(|_| Error::ContainerBorrowed { container: "array" })?;
            array.shrink()?;
            stats.arrays += 1;
            pending.extend(array.iter().filter(|v| v.is_container()).cloned());
        }
        Kind::Object(cell) => {
            let mut table = cell
                .try_borrow_mut()
                .map_err(|_| Error::ContainerBorrowed { container: "object" })?;
            table.shrink()?;
            stats.objects += 1;
            pending.extend(table.values().filter(|v| v.is_container()).cloned());
        }
        _ => {}
    }
    pending[start..].reverse();
    Ok(())
}
