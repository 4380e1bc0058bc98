//! Table: separately chained buckets over an arena of entries.
//!
//! Entries live in a `SlotMap` and chains link them by `EntryId`, so
//! relinking on resize moves handles, never entries, and an `EntryId` stays
//! valid across resizes. Releasing storage always goes through the table's
//! own policies; entries carry no reference back to their table.

use crate::error::TableError;
use crate::hashing::KeyHasher;
use crate::levels::{self, DensityBounds, Maintenance};
use crate::ownership::Ownership;
use core::cmp::Ordering;
use core::fmt;
use core::mem;
use log::{debug, trace, warn};
use slotmap::SlotMap;
use std::collections::TryReserveError;

slotmap::new_key_type! {
    pub(crate) struct EntryId;
}

pub(crate) struct Entry<KS, VS> {
    pub(crate) key: KS,
    pub(crate) value: Option<VS>,
    pub(crate) hash: u64,
    pub(crate) next: Option<EntryId>,
}

/// A position holding an `Option<EntryId>`: a bucket head, or the `next`
/// field of an entry in the chain.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Link {
    Head(usize),
    After(EntryId),
}

/// Result of walking a chain for a key.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Slot {
    pub(crate) hash: u64,
    /// Link that holds the match, or the empty link ending the chain.
    pub(crate) link: Link,
    pub(crate) found: Option<EntryId>,
}

/// Hash table with separate chaining and pluggable policies.
///
/// - `K`: key ownership policy. Lookups take `&K::View`.
/// - `V`: value ownership policy. Values are optional; `None` is a valid
///   mapping.
/// - `H`: hash/equality policy over `K::View`.
///
/// Single-threaded; mutation requires `&mut self`.
pub struct Table<K: Ownership, V: Ownership, H> {
    pub(crate) keys: K,
    pub(crate) values: V,
    pub(crate) hasher: H,
    pub(crate) entries: SlotMap<EntryId, Entry<K::Stored, V::Stored>>,
    pub(crate) heads: Vec<Option<EntryId>>,
    pub(crate) level: usize,
    pub(crate) bounds: DensityBounds,
    pub(crate) last_maintenance: Maintenance,
}

#[cfg(test)]
thread_local! {
    pub(crate) static FAIL_BUCKET_ALLOC: core::cell::Cell<bool> = const { core::cell::Cell::new(false) };
    pub(crate) static FAIL_ENTRY_ALLOC: core::cell::Cell<bool> = const { core::cell::Cell::new(false) };
}

fn empty_heads(count: usize) -> Result<Vec<Option<EntryId>>, TryReserveError> {
    #[cfg(test)]
    let count = if FAIL_BUCKET_ALLOC.with(|f| f.get()) {
        usize::MAX
    } else {
        count
    };
    let mut heads = Vec::new();
    heads.try_reserve_exact(count)?;
    heads.resize(count, None);
    Ok(heads)
}

impl<K, V, H> Table<K, V, H>
where
    K: Ownership,
    V: Ownership,
    H: KeyHasher<K::View>,
{
    /// Create an empty table at level 0 with the default density bounds.
    pub fn alloc(hasher: H, keys: K, values: V) -> Result<Self, TableError> {
        Self::with_bounds(hasher, keys, values, DensityBounds::default())
    }

    pub(crate) fn with_bounds(
        hasher: H,
        keys: K,
        values: V,
        bounds: DensityBounds,
    ) -> Result<Self, TableError> {
        let heads = empty_heads(levels::bucket_count(0))?;
        Ok(Table {
            keys,
            values,
            hasher,
            entries: SlotMap::with_key(),
            heads,
            level: 0,
            bounds,
            last_maintenance: Maintenance::Steady,
        })
    }

    /// Walk the chain `key` hashes to. The returned link either holds the
    /// matching entry or is the empty link at the end of the chain, so the
    /// same walk serves lookup, insertion and unlinking.
    ///
    /// Matching is decided by `compare` alone; stored hashes only pick the
    /// bucket.
    pub(crate) fn find_slot(&self, key: &K::View) -> Slot {
        let hash = self.hasher.hash(key);
        let mut link = Link::Head(self.bucket_of(hash));
        while let Some(id) = self.link(link) {
            let entry = &self.entries[id];
            if self.hasher.compare(self.keys.view(&entry.key), key) == Ordering::Equal {
                return Slot {
                    hash,
                    link,
                    found: Some(id),
                };
            }
            link = Link::After(id);
        }
        Slot {
            hash,
            link,
            found: None,
        }
    }

    /// Map `key` to `value`. Returns `true` if a new entry was created and
    /// `false` if an existing entry's value was replaced.
    ///
    /// On update only the value is re-acquired; the stored key is kept. On
    /// failure the table is unchanged.
    pub fn set(&mut self, key: &K::View, value: Option<&V::View>) -> Result<bool, TableError> {
        let slot = self.find_slot(key);
        if let Some(id) = slot.found {
            let fresh = self.acquire_value(value)?;
            let old = mem::replace(&mut self.entries[id].value, fresh);
            self.release_value(old);
            return Ok(false);
        }

        self.reserve_entry()?;
        let stored_key = self.keys.acquire(key)?;
        let stored_value = match self.acquire_value(value) {
            Ok(v) => v,
            Err(e) => {
                self.keys.release(stored_key);
                return Err(e);
            }
        };
        self.link_new(slot, stored_key, stored_value);
        self.maintain_density();
        Ok(true)
    }

    /// Like `set` with no value: the entry for `key` ends up with an empty
    /// value slot (an existing value is released), which the caller may fill
    /// through the returned [`ValueSlot`].
    pub fn emplace(&mut self, key: &K::View) -> Result<ValueSlot<'_, V>, TableError> {
        let slot = self.find_slot(key);
        let id = match slot.found {
            Some(id) => {
                let old = self.entries[id].value.take();
                self.release_value(old);
                id
            }
            None => {
                self.reserve_entry()?;
                let stored_key = self.keys.acquire(key)?;
                let id = self.link_new(slot, stored_key, None);
                self.maintain_density();
                id
            }
        };
        Ok(ValueSlot {
            policy: &self.values,
            slot: &mut self.entries[id].value,
        })
    }

    pub fn has(&self, key: &K::View) -> bool {
        self.find_slot(key).found.is_some()
    }

    /// Value stored for `key`.
    ///
    /// Returns `None` both when `key` is absent and when it maps to no value;
    /// use [`has`](Self::has) to tell them apart.
    pub fn get(&self, key: &K::View) -> Option<&V::View> {
        let id = self.find_slot(key).found?;
        self.entries[id]
            .value
            .as_ref()
            .map(|v| self.values.view(v))
    }

    /// Remove `key` and hand its value storage to the caller without
    /// releasing it. The key storage is released.
    ///
    /// Returns `None` when `key` is absent or mapped to no value.
    pub fn take(&mut self, key: &K::View) -> Option<V::Stored> {
        let slot = self.find_slot(key);
        let id = slot.found?;
        let value = self.remove_at(slot.link, id, false);
        self.maintain_density();
        value
    }

    /// Remove `key`, releasing both key and value. No-op when absent.
    pub fn delete(&mut self, key: &K::View) {
        let slot = self.find_slot(key);
        if let Some(id) = slot.found {
            let _ = self.remove_at(slot.link, id, true);
            self.maintain_density();
        }
    }

    /// Run one density step: shrink or grow the bucket array by one level if
    /// the load factor left the configured band.
    pub fn maintain_density(&mut self) -> Maintenance {
        let outcome = match self.bounds.next_level(self.level, self.entries.len()) {
            Some(target) => self.rehash(target),
            None => Maintenance::Steady,
        };
        self.last_maintenance = outcome;
        outcome
    }

    fn rehash(&mut self, target: usize) -> Maintenance {
        let from = self.heads.len();
        let to = levels::bucket_count(target);
        let mut heads = match empty_heads(to) {
            Ok(heads) => heads,
            Err(e) => {
                warn!("resize from {} to {} buckets abandoned: {}", from, to, e);
                return Maintenance::Abandoned { from, to };
            }
        };

        for bucket in 0..self.heads.len() {
            let mut cursor = self.heads[bucket].take();
            while let Some(id) = cursor {
                let entry = &mut self.entries[id];
                cursor = entry.next;
                let b = (entry.hash % to as u64) as usize;
                entry.next = heads[b];
                heads[b] = Some(id);
            }
        }

        let grew = target > self.level;
        self.heads = heads;
        self.level = target;
        debug!(
            "rehashed {} entries from {} to {} buckets (level {})",
            self.entries.len(),
            from,
            to,
            target
        );
        if grew {
            Maintenance::Grew { from, to }
        } else {
            Maintenance::Shrank { from, to }
        }
    }
}

impl<K, V, H> Table<K, V, H>
where
    K: Ownership,
    V: Ownership,
{
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.heads.len()
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn load_factor(&self) -> f64 {
        self.entries.len() as f64 / self.heads.len() as f64
    }

    pub fn density_bounds(&self) -> DensityBounds {
        self.bounds
    }

    /// Outcome of the most recent density step.
    pub fn last_maintenance(&self) -> Maintenance {
        self.last_maintenance
    }

    /// Release every entry. The bucket array keeps its current size.
    pub fn purge(&mut self) {
        let released = self.entries.len();
        for head in self.heads.iter_mut() {
            *head = None;
        }
        for (_, entry) in self.entries.drain() {
            self.keys.release(entry.key);
            if let Some(v) = entry.value {
                self.values.release(v);
            }
        }
        trace!(
            "purged {} entries, {} buckets kept",
            released,
            self.heads.len()
        );
    }

    /// Purge and drop the table behind `table`, leaving `None`. Does nothing
    /// when `table` is already `None`.
    pub fn free(table: &mut Option<Self>) {
        if let Some(mut t) = table.take() {
            t.purge();
            trace!("freed table at level {}", t.level);
        }
    }

    pub(crate) fn bucket_of(&self, hash: u64) -> usize {
        (hash % self.heads.len() as u64) as usize
    }

    pub(crate) fn link(&self, link: Link) -> Option<EntryId> {
        match link {
            Link::Head(b) => self.heads[b],
            Link::After(id) => self.entries[id].next,
        }
    }

    fn link_mut(&mut self, link: Link) -> &mut Option<EntryId> {
        match link {
            Link::Head(b) => &mut self.heads[b],
            Link::After(id) => &mut self.entries[id].next,
        }
    }

    /// Make room in the arena for one more entry so that `link_new` cannot
    /// fail after storage has been acquired.
    fn reserve_entry(&mut self) -> Result<(), TryReserveError> {
        #[cfg(test)]
        {
            if FAIL_ENTRY_ALLOC.with(|f| f.get()) {
                return Vec::<u8>::new().try_reserve_exact(usize::MAX);
            }
        }
        self.entries.try_reserve(1)
    }

    fn link_new(&mut self, slot: Slot, key: K::Stored, value: Option<V::Stored>) -> EntryId {
        let id = self.entries.insert(Entry {
            key,
            value,
            hash: slot.hash,
            next: None,
        });
        *self.link_mut(slot.link) = Some(id);
        id
    }

    /// Unlink entry `id` held at `link` and release its key. The value is
    /// released too when `release_value` is set, otherwise returned.
    pub(crate) fn remove_at(
        &mut self,
        link: Link,
        id: EntryId,
        release_value: bool,
    ) -> Option<V::Stored> {
        let entry = self.entries.remove(id)?;
        *self.link_mut(link) = entry.next;
        self.keys.release(entry.key);
        if release_value {
            self.release_value(entry.value);
            None
        } else {
            entry.value
        }
    }

    fn acquire_value(&self, value: Option<&V::View>) -> Result<Option<V::Stored>, TableError> {
        value.map(|v| self.values.acquire(v)).transpose()
    }

    fn release_value(&self, value: Option<V::Stored>) {
        if let Some(v) = value {
            self.values.release(v);
        }
    }
}

impl<K: Ownership, V: Ownership, H> Drop for Table<K, V, H> {
    fn drop(&mut self) {
        self.purge();
    }
}

impl<K: Ownership, V: Ownership, H> fmt::Debug for Table<K, V, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("size", &self.entries.len())
            .field("level", &self.level)
            .field("bucket_count", &self.heads.len())
            .finish()
    }
}

/// Mutable access to one entry's value slot, filled through the table's value
/// policy. Whatever the slot holds is released by the table like any other
/// stored value.
pub struct ValueSlot<'t, V: Ownership> {
    pub(crate) policy: &'t V,
    pub(crate) slot: &'t mut Option<V::Stored>,
}

impl<'t, V: Ownership> ValueSlot<'t, V> {
    /// Acquire `value` through the policy and store it, releasing the
    /// previous value. On failure the slot is unchanged.
    pub fn set(&mut self, value: &V::View) -> Result<(), TableError> {
        let fresh = self.policy.acquire(value)?;
        self.put(fresh);
        Ok(())
    }

    /// Store already-acquired storage, releasing the previous value.
    pub fn put(&mut self, stored: V::Stored) {
        if let Some(old) = self.slot.replace(stored) {
            self.policy.release(old);
        }
    }

    /// Release the current value and leave the slot empty.
    pub fn clear(&mut self) {
        if let Some(old) = self.slot.take() {
            self.policy.release(old);
        }
    }

    pub fn get(&self) -> Option<&V::View> {
        self.slot.as_ref().map(|v| self.policy.view(v))
    }

    pub fn get_mut(&mut self) -> Option<&mut V::Stored> {
        self.slot.as_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    /// The raw slot. Storage placed here must be releasable by the table's
    /// value policy.
    pub fn into_mut(self) -> &'t mut Option<V::Stored> {
        self.slot
    }
}
