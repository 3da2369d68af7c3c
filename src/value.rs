//! Value: the reference-counted, tagged node of the tree.
//!
//! A `Value` is an owning handle to a shared cell. Cloning the handle
//! increments the count and dropping it decrements; the cell's payload is
//! released exactly when the last handle goes away. Arrays and objects are
//! mutable in place behind a `RefCell`, so every holder of a handle to the
//! same container sees its mutations.
//!
//! Destruction of a container walks its subtree with an explicit work-list:
//! children whose last handle is being released are unpacked onto the list
//! instead of being dropped recursively, so freeing a deeply nested tree does
//! not consume call stack proportional to its depth.

use crate::array::GrowableArray;
use crate::error::{Error, Result};
use crate::ownership::Handoff;
use crate::shrink::{self, ShrinkStats};
use crate::table::OrderedHashTable;
use core::cell::{Ref, RefCell, RefMut};
use core::fmt;
use hashbrown::HashSet;
use std::rc::Rc;

/// Variant tag of a value, for type dispatch by callers.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ValueType {
    Null,
    True,
    False,
    Integer,
    Real,
    String,
    Array,
    Object,
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Null => "null",
            ValueType::True => "true",
            ValueType::False => "false",
            ValueType::Integer => "integer",
            ValueType::Real => "real",
            ValueType::String => "string",
            ValueType::Array => "array",
            ValueType::Object => "object",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub(crate) enum Kind {
    Null,
    True,
    False,
    Integer(i64),
    Real(f64),
    String(Box<[u8]>),
    Array(RefCell<GrowableArray>),
    Object(RefCell<OrderedHashTable>),
}

impl Kind {
    /// Move every child handle out of a container payload.
    fn detach_children(&mut self, pending: &mut Vec<Value>) {
        match self {
            Kind::Array(cell) => cell.get_mut().detach_into(pending),
            Kind::Object(cell) => cell.get_mut().detach_into(pending),
            _ => {}
        }
    }
}

impl Drop for Kind {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(child) = pending.pop() {
            // Only a sole owner unpacks; shared children just lose one count.
            if let Ok(mut kind) = Rc::try_unwrap(child.0) {
                kind.detach_children(&mut pending);
            }
        }
    }
}

/// Owning handle to a reference-counted value cell.
#[derive(Clone)]
pub struct Value(Rc<Kind>);

impl Value {
    fn from_kind(kind: Kind) -> Self {
        Value(Rc::new(kind))
    }

    pub fn null() -> Self {
        Self::from_kind(Kind::Null)
    }

    pub fn boolean(b: bool) -> Self {
        Self::from_kind(if b { Kind::True } else { Kind::False })
    }

    pub fn integer(n: i64) -> Self {
        Self::from_kind(Kind::Integer(n))
    }

    pub fn real(x: f64) -> Self {
        Self::from_kind(Kind::Real(x))
    }

    /// A string value owning a copy of `bytes`. No encoding is enforced.
    pub fn string<B: Into<Vec<u8>>>(bytes: B) -> Self {
        Self::from_kind(Kind::String(bytes.into().into_boxed_slice()))
    }

    /// An empty array with no backing storage.
    pub fn array() -> Self {
        Self::from_kind(Kind::Array(RefCell::new(GrowableArray::new())))
    }

    /// An empty object at order 0.
    pub fn object() -> Self {
        Self::from_kind(Kind::Object(RefCell::new(OrderedHashTable::new())))
    }

    pub(crate) fn kind(&self) -> &Kind {
        &self.0
    }

    /// Address of the shared cell; equal for every handle to the same value.
    pub(crate) fn addr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }

    pub fn value_type(&self) -> ValueType {
        match self.kind() {
            Kind::Null => ValueType::Null,
            Kind::True => ValueType::True,
            Kind::False => ValueType::False,
            Kind::Integer(_) => ValueType::Integer,
            Kind::Real(_) => ValueType::Real,
            Kind::String(_) => ValueType::String,
            Kind::Array(_) => ValueType::Array,
            Kind::Object(_) => ValueType::Object,
        }
    }

    /// Number of live handles to this value.
    pub fn refcount(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    /// True when both handles refer to the same cell.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind(), Kind::Null)
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind(), Kind::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind(), Kind::Object(_))
    }

    pub fn is_container(&self) -> bool {
        self.is_array() || self.is_object()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.kind() {
            Kind::True => Some(true),
            Kind::False => Some(false),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.kind() {
            Kind::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.kind() {
            Kind::Real(x) => Some(*x),
            _ => None,
        }
    }

    /// Integer or real, widened to `f64`.
    pub fn as_number(&self) -> Option<f64> {
        match self.kind() {
            Kind::Integer(n) => Some(*n as f64),
            Kind::Real(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self.kind() {
            Kind::String(b) => Some(&**b),
            _ => None,
        }
    }

    /// The string payload, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| core::str::from_utf8(b).ok())
    }

    fn mismatch(&self, expected: ValueType) -> Error {
        Error::TypeMismatch {
            expected: expected.name(),
            found: self.value_type().name(),
        }
    }

    /// Borrow the array payload.
    ///
    /// Panics if the same array is currently borrowed mutably.
    pub fn as_array(&self) -> Result<Ref<'_, GrowableArray>> {
        match self.kind() {
            Kind::Array(cell) => Ok(cell.borrow()),
            _ => Err(self.mismatch(ValueType::Array)),
        }
    }

    /// Mutably borrow the array payload.
    ///
    /// Panics if the same array is currently borrowed.
    pub fn as_array_mut(&self) -> Result<RefMut<'_, GrowableArray>> {
        match self.kind() {
            Kind::Array(cell) => Ok(cell.borrow_mut()),
            _ => Err(self.mismatch(ValueType::Array)),
        }
    }

    pub fn as_object(&self) -> Result<Ref<'_, OrderedHashTable>> {
        match self.kind() {
            Kind::Object(cell) => Ok(cell.borrow()),
            _ => Err(self.mismatch(ValueType::Object)),
        }
    }

    pub fn as_object_mut(&self) -> Result<RefMut<'_, OrderedHashTable>> {
        match self.kind() {
            Kind::Object(cell) => Ok(cell.borrow_mut()),
            _ => Err(self.mismatch(ValueType::Object)),
        }
    }

    /// Entry count of an array or object.
    pub fn len(&self) -> Option<usize> {
        match self.kind() {
            Kind::Array(cell) => Some(cell.borrow().len()),
            Kind::Object(cell) => Some(cell.borrow().len()),
            _ => None,
        }
    }

    pub fn array_append<H: Handoff>(&self, value: H) -> Result<()> {
        self.as_array_mut()?.append(value)
    }

    pub fn array_insert<H: Handoff>(&self, index: usize, value: H) -> Result<()> {
        self.as_array_mut()?.insert(index, value)
    }

    /// New handle to the element at `index`; `None` when out of range or
    /// not an array.
    pub fn array_get(&self, index: usize) -> Option<Value> {
        self.as_array().ok()?.get(index).cloned()
    }

    pub fn array_set<H: Handoff>(&self, index: usize, value: H) -> Result<()> {
        self.as_array_mut()?.set(index, value)
    }

    pub fn array_remove(&self, index: usize) -> Result<()> {
        self.as_array_mut()?.remove(index)
    }

    pub fn array_clear(&self) -> Result<()> {
        self.as_array_mut()?.clear();
        Ok(())
    }

    /// Append every element of the array `other`, borrowing each.
    pub fn array_extend(&self, other: &Value) -> Result<()> {
        if self.ptr_eq(other) {
            let mut array = self.as_array_mut()?;
            let snapshot: Vec<Value> = array.iter().cloned().collect();
            return array.extend_from_slice(&snapshot);
        }
        let source = other.as_array()?;
        self.as_array_mut()?.extend(&*source)
    }

    pub fn object_set<H: Handoff>(&self, key: &str, value: H) -> Result<()> {
        self.as_object_mut()?.set(key, value)
    }

    /// New handle to the value under `key`; `None` when missing or not an
    /// object.
    pub fn object_get(&self, key: &str) -> Option<Value> {
        self.as_object().ok()?.get(key).cloned()
    }

    pub fn object_del(&self, key: &str) -> Result<()> {
        self.as_object_mut()?.del(key)
    }

    pub fn object_clear(&self) -> Result<()> {
        self.as_object_mut()?.clear();
        Ok(())
    }

    /// Set every entry of the object `other` into this one, borrowing each
    /// value.
    pub fn object_update(&self, other: &Value) -> Result<()> {
        if self.ptr_eq(other) {
            return self.as_object().map(|_| ());
        }
        let source = other.as_object()?;
        self.as_object_mut()?.update(&*source)
    }

    /// Shrink this container's own storage to exact fit. Scalars are left
    /// alone. A container borrowed through `as_array`/`as_object` reports
    /// `ContainerBorrowed`.
    pub fn shrink(&self) -> Result<()> {
        match self.kind() {
            Kind::Array(cell) => cell
                .try_borrow_mut()
                .map_err(|_| Error::ContainerBorrowed { container: "array" })?
                .shrink(),
            Kind::Object(cell) => cell
                .try_borrow_mut()
                .map_err(|_| Error::ContainerBorrowed { container: "object" })?
                .shrink(),
            _ => Ok(()),
        }
    }

    /// Shrink this container and every container reachable from it.
    pub fn shrink_recursive(&self) -> Result<ShrinkStats> {
        shrink::shrink_recursive(self)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::integer(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::real(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<GrowableArray> for Value {
    fn from(a: GrowableArray) -> Self {
        Value::from_kind(Kind::Array(RefCell::new(a)))
    }
}

impl From<OrderedHashTable> for Value {
    fn from(t: OrderedHashTable) -> Self {
        Value::from_kind(Kind::Object(RefCell::new(t)))
    }
}

enum DebugStep {
    Text(&'static str),
    Key(Box<str>),
    Value(Value),
    // Closing bracket of the container at this address.
    Close(*const (), &'static str),
}

/// JSON-like rendering. Nested containers are expanded from an explicit
/// work-list, so arbitrarily deep trees format without deep recursion. A
/// container that contains itself renders the inner occurrence as `[...]`
/// or `{...}`.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut open: HashSet<*const ()> = HashSet::new();
        let mut pending = vec![DebugStep::Value(self.clone())];
        while let Some(step) = pending.pop() {
            let value = match step {
                DebugStep::Text(s) => {
                    f.write_str(s)?;
                    continue;
                }
                DebugStep::Key(k) => {
                    write!(f, "{k:?}: ")?;
                    continue;
                }
                DebugStep::Close(addr, s) => {
                    open.remove(&addr);
                    f.write_str(s)?;
                    continue;
                }
                DebugStep::Value(v) => v,
            };
            if value.is_container() && open.contains(&value.addr()) {
                f.write_str(if value.is_array() { "[...]" } else { "{...}" })?;
                continue;
            }
            match value.kind() {
                Kind::Null => f.write_str("null")?,
                Kind::True => f.write_str("true")?,
                Kind::False => f.write_str("false")?,
                Kind::Integer(n) => write!(f, "{n}")?,
                Kind::Real(x) => write!(f, "{x:?}")?,
                Kind::String(b) => write!(f, "{:?}", String::from_utf8_lossy(b))?,
                Kind::Array(cell) => match cell.try_borrow() {
                    Ok(a) => {
                        f.write_str("[")?;
                        open.insert(value.addr());
                        pending.push(DebugStep::Close(value.addr(), "]"));
                        for (i, v) in a.iter().enumerate().rev() {
                            pending.push(DebugStep::Value(v.clone()));
                            if i > 0 {
                                pending.push(DebugStep::Text(", "));
                            }
                        }
                    }
                    Err(_) => f.write_str("[<borrowed>]")?,
                },
                Kind::Object(cell) => match cell.try_borrow() {
                    Ok(t) => {
                        f.write_str("{")?;
                        open.insert(value.addr());
                        pending.push(DebugStep::Close(value.addr(), "}"));
                        let entries: Vec<(&str, &Value)> = t.iter().collect();
                        for (i, (k, v)) in entries.into_iter().enumerate().rev() {
                            pending.push(DebugStep::Value(v.clone()));
                            pending.push(DebugStep::Key(k.into()));
                            if i > 0 {
                                pending.push(DebugStep::Text(", "));
                            }
                        }
                    }
                    Err(_) => f.write_str("{<borrowed>}")?,
                },
            }
        }
        Ok(())
    }
}

/// Structural equality. Objects compare without regard to insertion order.
///
/// Walks both trees with an explicit work-list. Cyclic values never compare
/// equal to anything but themselves and may not terminate otherwise.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        let mut pending = vec![(self.clone(), other.clone())];
        while let Some((a, b)) = pending.pop() {
            if a.ptr_eq(&b) {
                continue;
            }
            let same = match (a.kind(), b.kind()) {
                (Kind::Null, Kind::Null)
                | (Kind::True, Kind::True)
                | (Kind::False, Kind::False) => true,
                (Kind::Integer(x), Kind::Integer(y)) => x == y,
                (Kind::Real(x), Kind::Real(y)) => x == y,
                (Kind::String(x), Kind::String(y)) => x == y,
                (Kind::Array(x), Kind::Array(y)) => {
                    let (x, y) = (x.borrow(), y.borrow());
                    if x.len() == y.len() {
                        pending.extend(x.iter().cloned().zip(y.iter().cloned()));
                        true
                    } else {
                        false
                    }
                }
                (Kind::Object(x), Kind::Object(y)) => {
                    let (x, y) = (x.borrow(), y.borrow());
                    x.len() == y.len()
                        && x.iter().all(|(k, v)| match y.get(k) {
                            Some(w) => {
                                pending.push((v.clone(), w.clone()));
                                true
                            }
                            None => false,
                        })
                }
                _ => false,
            };
            if !same {
                return false;
            }
        }
        true
    }
}
