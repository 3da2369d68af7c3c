//! OrderedHashTable: string-keyed table with power-of-two bucket sizing and
//! insertion-ordered iteration.
//!
//! Layout
//! - Entries live in a `SlotMap` so they keep a stable generational key for
//!   their whole life; nothing ever moves when the bucket array changes.
//! - `buckets` holds exactly `2^order` chain heads. Entries in the same
//!   bucket are chained through `Entry::chain`.
//! - A doubly linked list through `Entry::prev`/`Entry::next` records
//!   insertion order, so iteration and rehashing walk live entries in the
//!   order they were added.
//! - Each entry stores its precomputed `u64` hash; rehashing only re-masks
//!   stored hashes and never hashes a key again.
//!
//! Sizing
//! - `order` only grows during `set`, by the smallest step that keeps
//!   `2^order >= len`. `del` never shrinks; `shrink` recomputes the minimal
//!   order and rehashes when it differs.
//! - Bucket storage is allocated on first insert, so an empty table owns no
//!   memory beyond the struct itself.

use crate::error::{Error, Result};
use crate::ownership::Handoff;
use crate::resize;
use crate::value::Value;
use core::fmt;
use core::hash::BuildHasher;
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;

#[derive(Debug)]
struct Entry {
    key: Box<str>,
    value: Value,
    hash: u64,
    // Next entry in the same bucket.
    chain: Option<DefaultKey>,
    // Insertion-order neighbours.
    prev: Option<DefaultKey>,
    next: Option<DefaultKey>,
}

pub struct OrderedHashTable<S = RandomState> {
    hasher: S,
    buckets: Vec<Option<DefaultKey>>,
    order: u32,
    slots: SlotMap<DefaultKey, Entry>,
    head: Option<DefaultKey>,
    tail: Option<DefaultKey>,
}

impl OrderedHashTable {
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl Default for OrderedHashTable {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn bucket_of(hash: u64, count: usize) -> usize {
    (hash as usize) & (count - 1)
}

fn no_room(requested: usize) -> Error {
    Error::AllocationFailure {
        container: "object",
        requested,
    }
}

/// Iterator over `(key, value)` pairs in insertion order.
pub struct Iter<'a> {
    slots: &'a SlotMap<DefaultKey, Entry>,
    cur: Option<DefaultKey>,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a Value);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let e = self.slots.get(self.cur?)?;
        self.cur = e.next;
        self.remaining -= 1;
        Some((&*e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<S> OrderedHashTable<S>
where
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            buckets: Vec::new(),
            order: 0,
            slots: SlotMap::with_key(),
            head: None,
            tail: None,
        }
    }

    fn make_hash(&self, key: &str) -> u64 {
        self.hasher.hash_one(key)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Current bucket exponent; the table has `2^order` buckets.
    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn bucket_count(&self) -> usize {
        1usize << self.order
    }

    fn find(&self, key: &str, hash: u64) -> Option<DefaultKey> {
        if self.buckets.is_empty() {
            return None;
        }
        let mut cur = self.buckets[bucket_of(hash, self.buckets.len())];
        while let Some(k) = cur {
            let e = &self.slots[k];
            if e.hash == hash && &*e.key == key {
                return Some(k);
            }
            cur = e.chain;
        }
        None
    }

    /// Borrow the value stored under `key`; the reference count is not touched.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let k = self.find(key, self.make_hash(key))?;
        Some(&self.slots[k].value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.find(key, self.make_hash(key)).is_some()
    }

    /// Insert or replace the value under `key`.
    ///
    /// Replacing releases the previous value and leaves the size unchanged.
    /// A new key is appended to the insertion order; if it would overflow
    /// `2^order` buckets, the table rehashes into a larger bucket array
    /// first. A failed rehash leaves the table untouched.
    pub fn set<H: Handoff>(&mut self, key: &str, value: H) -> Result<()> {
        let hash = self.make_hash(key);
        if let Some(k) = self.find(key, hash) {
            let old = core::mem::replace(&mut self.slots[k].value, value.hand_off());
            drop(old);
            return Ok(());
        }

        let len = self.slots.len() + 1;
        let order = resize::grown_order(self.order, len).ok_or_else(|| no_room(len))?;
        if order != self.order || self.buckets.is_empty() {
            self.rehash(order)?;
        }

        let b = bucket_of(hash, self.buckets.len());
        let k = self.slots.insert(Entry {
            key: key.into(),
            value: value.hand_off(),
            hash,
            chain: self.buckets[b],
            prev: self.tail,
            next: None,
        });
        self.buckets[b] = Some(k);
        match self.tail {
            Some(t) => self.slots[t].next = Some(k),
            None => self.head = Some(k),
        }
        self.tail = Some(k);
        Ok(())
    }

    /// Remove `key`, releasing its value and key storage. Never shrinks.
    pub fn del(&mut self, key: &str) -> Result<()> {
        let hash = self.make_hash(key);
        let not_found = || Error::KeyNotFound { key: key.into() };
        if self.buckets.is_empty() {
            return Err(not_found());
        }

        let b = bucket_of(hash, self.buckets.len());
        let mut before = None;
        let mut cur = self.buckets[b];
        while let Some(k) = cur {
            let e = &self.slots[k];
            if e.hash == hash && &*e.key == key {
                break;
            }
            before = Some(k);
            cur = e.chain;
        }
        let Some(k) = cur else {
            return Err(not_found());
        };
        let Some(entry) = self.slots.remove(k) else {
            return Err(not_found());
        };

        match before {
            Some(p) => self.slots[p].chain = entry.chain,
            None => self.buckets[b] = entry.chain,
        }
        match entry.prev {
            Some(p) => self.slots[p].next = entry.next,
            None => self.head = entry.next,
        }
        match entry.next {
            Some(n) => self.slots[n].prev = entry.prev,
            None => self.tail = entry.prev,
        }
        // Fully unlinked; releasing the value cannot observe a broken table.
        drop(entry);
        Ok(())
    }

    /// Rehash into the minimal order for the current size.
    ///
    /// Insertion order and every value handle are preserved. An empty table
    /// releases its bucket storage.
    pub fn shrink(&mut self) -> Result<()> {
        if self.slots.is_empty() {
            if !self.buckets.is_empty() || self.order != 0 {
                log::trace!("object shrink: order {} -> 0 (empty)", self.order);
            }
            self.buckets = Vec::new();
            self.order = 0;
            return Ok(());
        }
        let len = self.slots.len();
        let order = resize::min_order(len).ok_or_else(|| no_room(len))?;
        if order == self.order {
            return Ok(());
        }
        self.rehash(order)
    }

    /// Allocate `2^order` buckets and relink every live entry into them.
    fn rehash(&mut self, order: u32) -> Result<()> {
        let count = resize::bucket_count(order).ok_or_else(|| no_room(usize::MAX))?;
        let mut buckets = Vec::new();
        resize::reserve_exact(&mut buckets, count, "object")?;
        buckets.resize(count, None);

        let mut cur = self.head;
        while let Some(k) = cur {
            let e = &mut self.slots[k];
            let b = bucket_of(e.hash, count);
            e.chain = buckets[b];
            buckets[b] = Some(k);
            cur = e.next;
        }
        log::trace!(
            "object rehash: order {} -> {} ({} entries)",
            self.order,
            order,
            self.slots.len()
        );
        self.buckets = buckets;
        self.order = order;
        Ok(())
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            slots: &self.slots,
            cur: self.head,
            remaining: self.slots.len(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Release every entry. The order and bucket storage are kept.
    pub fn clear(&mut self) {
        let old = core::mem::replace(&mut self.slots, SlotMap::with_key());
        self.head = None;
        self.tail = None;
        self.buckets.iter_mut().for_each(|b| *b = None);
        drop(old);
    }

    /// Set every entry of `other` into this table, borrowing each value.
    ///
    /// The table grows once, up front, for all keys it does not yet hold, so
    /// a failure leaves it untouched.
    pub fn update<S2: BuildHasher>(&mut self, other: &OrderedHashTable<S2>) -> Result<()> {
        let incoming = other.keys().filter(|k| !self.contains_key(k)).count();
        if incoming > 0 {
            let len = self.slots.len() + incoming;
            let order = resize::grown_order(self.order, len).ok_or_else(|| no_room(len))?;
            if order != self.order || self.buckets.is_empty() {
                self.rehash(order)?;
            }
        }
        for (k, v) in other.iter() {
            self.set(k, v)?;
        }
        Ok(())
    }

    /// Move every value into `pending`, leaving the table empty.
    pub(crate) fn detach_into(&mut self, pending: &mut Vec<Value>) {
        let slots = core::mem::replace(&mut self.slots, SlotMap::with_key());
        self.buckets = Vec::new();
        self.order = 0;
        self.head = None;
        self.tail = None;
        pending.extend(slots.into_iter().map(|(_, e)| e.value));
    }
}

impl<S: BuildHasher> fmt::Debug for OrderedHashTable<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, S: BuildHasher> IntoIterator for &'a OrderedHashTable<S> {
    type Item = (&'a str, &'a Value);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
