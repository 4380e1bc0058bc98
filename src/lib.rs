//! chainmap: a separately chained, dynamically resizing hash table with
//! pluggable hashing and per-side ownership policies.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one container whose hashing, equality, and key/value storage
//!   discipline are chosen by the caller at construction and fixed for the
//!   table's lifetime.
//! - Pieces:
//!   - Ownership policies (`ownership`): how keys and values are copied in
//!     and released. `Inline` keeps a bitwise copy, `Custom` runs caller
//!     copy/free functions, `PassThrough` stores the caller's reference.
//!   - Hash policies (`hashing`): `KeyHasher` pairs a hash function with an
//!     equality test; integer, string, byte-buffer, `Hash`-based and
//!     closure-based policies are provided.
//!   - Bucket array and resize controller (`table`, `levels`): chains of
//!     entries hang off a bucket array whose length walks a fixed prime
//!     sequence to keep the load factor within `[0.25, 2.0)`.
//!   - Traversal (`traversal`): callback-driven walk that survives the
//!     callback deleting the entry it was handed.
//!
//! Constraints
//! - Single-threaded: no internal synchronization.
//! - Unique keys under the hash policy's equality; `set` on an existing key
//!   replaces the value in place and keeps the stored key.
//! - Values are optional: `None` is a valid mapping and is stored without
//!   calling the value policy. `get` returns `None` for it, the same as for an
//!   absent key; `has` distinguishes the two.
//! - No iterator objects; traversal is `foreach` only.
//!
//! Entries and chains
//! - Entries live in a `SlotMap` arena; chains link them by generational
//!   `EntryId`. Relinking on resize moves ids, not entries.
//! - Each entry keeps the hash computed at insertion, so resizing never calls
//!   back into the hash policy.
//! - Entries hold no reference to their table. Release goes through the
//!   table's policies, passed explicitly.
//!
//! Resizing
//! - Every insertion or removal runs one density step afterwards. A step moves
//!   at most one level along the sequence. At the top of the sequence the
//!   table keeps accepting entries with longer chains.
//! - A step that cannot allocate the new bucket array is abandoned: the
//!   triggering operation still succeeds, the outcome is recorded as
//!   `Maintenance::Abandoned`, and the next structural change retries.
//! - `purge` never resizes.
//!
//! Traversal
//! - Buckets in index order, chains from the head. The callback sees a
//!   `Cursor` that can read the entry, update its value, or remove it; no
//!   other structural change is reachable from inside the walk.
//! - Density maintenance for removals made during the walk runs after the
//!   walk returns.
//!
//! Errors
//! - `TableError::AllocationFailure` when a copy, the arena slot for a new
//!   entry, or the initial bucket array cannot get storage; the operation has
//!   no effect.
//! - `TableError::InvalidArgument` for configuration rejected by
//!   `TableBuilder::build`.
//! - Callback failures propagate out of `foreach` with the callback's own
//!   error type.

mod builder;
mod error;
pub mod hashing;
pub mod levels;
pub mod ownership;
mod table;
mod table_proptest;
mod traversal;

// Public surface
pub use builder::TableBuilder;
pub use error::TableError;
pub use levels::{DensityBounds, Maintenance};
pub use table::{Table, ValueSlot};
pub use traversal::{Cursor, Traversal, Visit};
