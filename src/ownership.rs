//! Ownership policies: how a table materializes and releases key or value
//! storage.
//!
//! A policy is chosen per table, independently for keys and values:
//! - [`Inline`]: a fixed-size bitwise copy kept inside the entry.
//! - [`Custom`]: a caller-supplied copy function, and optionally a free
//!   function that runs when the table lets go of the storage.
//! - [`PassThrough`]: the caller's reference is stored verbatim; the table
//!   never allocates or releases what it points to.
//!
//! Values may be absent (`None`); an absent value is stored as `None` and
//! never reaches [`Ownership::acquire`].

use crate::error::TableError;
use core::borrow::Borrow;
use core::fmt;
use core::marker::PhantomData;

/// Capability set for one side (keys or values) of a table.
pub trait Ownership {
    /// Borrowed form that callers pass in, lookups compare against and
    /// `get` hands back.
    type View: ?Sized;
    /// Form held by an entry.
    type Stored;

    /// Produce owned storage from the caller's view.
    fn acquire(&self, src: &Self::View) -> Result<Self::Stored, TableError>;

    fn view<'s>(&self, stored: &'s Self::Stored) -> &'s Self::View;

    /// Give storage back. Runs exactly once for every stored item the table
    /// still owns when it is deleted, overwritten, purged or dropped.
    fn release(&self, stored: Self::Stored);
}

/// Fixed-size copy of a `Copy` type, stored inside the entry.
pub struct Inline<T>(PhantomData<fn() -> T>);

impl<T> Inline<T> {
    pub const fn new() -> Self {
        Inline(PhantomData)
    }
}

impl<T> Default for Inline<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Inline<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Inline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Inline")
    }
}

impl<T: Copy> Ownership for Inline<T> {
    type View = T;
    type Stored = T;

    #[inline]
    fn acquire(&self, src: &T) -> Result<T, TableError> {
        Ok(*src)
    }

    #[inline]
    fn view<'s>(&self, stored: &'s T) -> &'s T {
        stored
    }

    #[inline]
    fn release(&self, _stored: T) {}
}

/// Caller-supplied copy (and optional free) functions.
///
/// `copy` turns a borrowed `B` into owned `O`; it may fail with
/// [`TableError::AllocationFailure`], in which case the operation that asked
/// for the copy has no effect. Without a free function, released storage is
/// simply dropped.
pub struct Custom<B: ?Sized, O, C, F = fn(O)> {
    copy: C,
    free: F,
    _pd: PhantomData<fn(&B) -> O>,
}

impl<B, O, C> Custom<B, O, C>
where
    B: ?Sized,
    O: Borrow<B>,
    C: Fn(&B) -> Result<O, TableError>,
{
    pub fn new(copy: C) -> Self {
        Custom {
            copy,
            free: drop::<O>,
            _pd: PhantomData,
        }
    }
}

impl<B, O, C, F> Custom<B, O, C, F>
where
    B: ?Sized,
    O: Borrow<B>,
    C: Fn(&B) -> Result<O, TableError>,
    F: Fn(O),
{
    pub fn with_free(copy: C, free: F) -> Self {
        Custom {
            copy,
            free,
            _pd: PhantomData,
        }
    }
}

impl<B: ?Sized, O, C, F> fmt::Debug for Custom<B, O, C, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Custom")
    }
}

impl<B, O, C, F> Ownership for Custom<B, O, C, F>
where
    B: ?Sized,
    O: Borrow<B>,
    C: Fn(&B) -> Result<O, TableError>,
    F: Fn(O),
{
    type View = B;
    type Stored = O;

    fn acquire(&self, src: &B) -> Result<O, TableError> {
        (self.copy)(src)
    }

    #[inline]
    fn view<'s>(&self, stored: &'s O) -> &'s B {
        stored.borrow()
    }

    fn release(&self, stored: O) {
        (self.free)(stored)
    }
}

/// Stores the caller's reference as given. The referent must outlive the
/// table; the table never frees it.
pub struct PassThrough<'a, T: ?Sized>(PhantomData<&'a T>);

impl<'a, T: ?Sized> PassThrough<'a, T> {
    pub const fn new() -> Self {
        PassThrough(PhantomData)
    }
}

impl<'a, T: ?Sized> Default for PassThrough<'a, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: ?Sized> Clone for PassThrough<'a, T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<'a, T: ?Sized> fmt::Debug for PassThrough<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PassThrough")
    }
}

impl<'a, T: ?Sized> Ownership for PassThrough<'a, T> {
    type View = &'a T;
    type Stored = &'a T;

    #[inline]
    fn acquire(&self, src: &&'a T) -> Result<&'a T, TableError> {
        Ok(*src)
    }

    #[inline]
    fn view<'s>(&self, stored: &'s &'a T) -> &'s &'a T {
        stored
    }

    #[inline]
    fn release(&self, _stored: &'a T) {}
}

/// Policy that duplicates `&str` input into an owned `String`.
pub type OwnedStr = Custom<str, String, fn(&str) -> Result<String, TableError>>;

pub fn owned_str() -> OwnedStr {
    Custom::new(copy_str as fn(&str) -> Result<String, TableError>)
}

fn copy_str(src: &str) -> Result<String, TableError> {
    let mut out = String::new();
    out.try_reserve_exact(src.len())?;
    out.push_str(src);
    Ok(out)
}
