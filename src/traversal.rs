//! Callback traversal that tolerates the callback deleting the entry it is
//! visiting.
//!
//! Before each call the engine knows the link that holds the visited entry.
//! Afterwards, if that link still holds the same `EntryId`, the walk moves to
//! the entry's `next`; otherwise the entry was unlinked, the link already
//! holds its successor, and the walk stays put so the successor is not
//! skipped. Generational ids keep a reused arena slot from looking like the
//! entry that was removed.
//!
//! The only structural change a callback can make is through its [`Cursor`],
//! which can remove just the current entry. Density maintenance is deferred
//! until the walk is over, so the bucket array is never reallocated under it.

use crate::hashing::KeyHasher;
use crate::levels::Maintenance;
use crate::ownership::Ownership;
use crate::table::{EntryId, Link, Table, ValueSlot};

/// What the callback wants next.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Visit {
    Continue,
    Stop,
}

/// How a traversal that did not fail ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Traversal {
    Completed,
    Stopped,
}

/// The entry currently being visited.
pub struct Cursor<'t, K: Ownership, V: Ownership, H> {
    table: &'t mut Table<K, V, H>,
    link: Link,
    id: EntryId,
}

impl<'t, K: Ownership, V: Ownership, H> Cursor<'t, K, V, H> {
    pub fn key(&self) -> &K::View {
        self.table.keys.view(&self.table.entries[self.id].key)
    }

    pub fn value(&self) -> Option<&V::View> {
        let table = &*self.table;
        table.entries[self.id]
            .value
            .as_ref()
            .map(|v| table.values.view(v))
    }

    pub fn value_slot(&mut self) -> ValueSlot<'_, V> {
        ValueSlot {
            policy: &self.table.values,
            slot: &mut self.table.entries[self.id].value,
        }
    }

    /// Read-only view of the whole table.
    pub fn table(&self) -> &Table<K, V, H> {
        self.table
    }

    /// Remove the current entry, releasing key and value.
    pub fn delete(self) {
        let _ = self.table.remove_at(self.link, self.id, true);
    }

    /// Remove the current entry and return its value storage unreleased.
    pub fn take(self) -> Option<V::Stored> {
        self.table.remove_at(self.link, self.id, false)
    }
}

impl<K, V, H> Table<K, V, H>
where
    K: Ownership,
    V: Ownership,
    H: KeyHasher<K::View>,
{
    /// Visit every entry, bucket by bucket, each chain from its head.
    ///
    /// The callback returns `Ok(Visit::Continue)` to go on, `Ok(Visit::Stop)`
    /// to end the walk early, or an error that aborts the walk and is
    /// returned as is. Side effects of calls made before a failure stay.
    ///
    /// Entries removed through the cursor are accounted for once the walk
    /// ends, by running density maintenance until the table is back inside
    /// its band.
    pub fn foreach<E, F>(&mut self, mut visit: F) -> Result<Traversal, E>
    where
        F: FnMut(Cursor<'_, K, V, H>) -> Result<Visit, E>,
    {
        let before = self.size();
        let result = self.walk(&mut visit);
        if self.size() != before {
            self.settle();
        }
        result
    }

    fn walk<E, F>(&mut self, visit: &mut F) -> Result<Traversal, E>
    where
        F: FnMut(Cursor<'_, K, V, H>) -> Result<Visit, E>,
    {
        for bucket in 0..self.bucket_count() {
            let mut link = Link::Head(bucket);
            while let Some(id) = self.link(link) {
                let flow = visit(Cursor {
                    table: &mut *self,
                    link,
                    id,
                })?;
                if flow == Visit::Stop {
                    return Ok(Traversal::Stopped);
                }
                if self.link(link) == Some(id) {
                    link = Link::After(id);
                }
            }
        }
        Ok(Traversal::Completed)
    }

    fn settle(&mut self) {
        while self.maintain_density().resized() {}
        if let Maintenance::Abandoned { from, to } = self.last_maintenance() {
            log::warn!(
                "traversal left {} entries in {} buckets; resize to {} abandoned",
                self.size(),
                from,
                to
            );
        }
    }
}
