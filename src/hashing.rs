//! Hash and equality policies.
//!
//! A table never calls `Hash`/`Eq` on its keys directly; it goes through a
//! [`KeyHasher`] chosen at construction. `compare` only has to be
//! `Ordering::Equal` exactly for equal keys, the other two orderings are
//! treated alike.
//!
//! `hash` only chooses the bucket. Within a bucket, keys are matched by
//! `compare` alone, so two keys that compare equal are the same key even if
//! they hash differently and happen to share a bucket.

use core::cmp::Ordering;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use hashbrown::hash_map::DefaultHashBuilder;

pub trait KeyHasher<Q: ?Sized> {
    fn hash(&self, key: &Q) -> u64;
    fn compare(&self, stored: &Q, probe: &Q) -> Ordering;
}

const DJB_SEED: u64 = 5381;

/// 64-bit avalanche finalizer for integer identity keys.
#[inline]
pub const fn int_mix(key: u64) -> u64 {
    let mut x = key;
    x = (x ^ (x >> 31) ^ (x >> 62)).wrapping_mul(0x319642b2d24d8ec3);
    x = (x ^ (x >> 27) ^ (x >> 54)).wrapping_mul(0x96de1b173f119089);
    x ^ (x >> 30) ^ (x >> 60)
}

/// djb2: `hash * 33 + byte`.
#[inline]
pub fn djb2(bytes: &[u8]) -> u64 {
    bytes.iter().fold(DJB_SEED, |h, &b| {
        (h << 5).wrapping_add(h).wrapping_add(u64::from(b))
    })
}

/// djb2 variant mixing each byte in with xor: `(hash * 33) ^ byte`.
#[inline]
pub fn djb2_xor(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(DJB_SEED, |h, &b| (h << 5).wrapping_add(h) ^ u64::from(b))
}

/// Integer keys: identity value run through [`int_mix`], compared by
/// signed difference.
#[derive(Copy, Clone, Debug, Default)]
pub struct IntHash;

macro_rules! int_hash_impl {
    ($($t:ty),* $(,)?) => {$(
        impl KeyHasher<$t> for IntHash {
            #[inline]
            fn hash(&self, key: &$t) -> u64 {
                int_mix(*key as u64)
            }

            #[inline]
            fn compare(&self, stored: &$t, probe: &$t) -> Ordering {
                probe.cmp(stored)
            }
        }
    )*};
}

int_hash_impl!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

/// String keys: [`djb2`] over the UTF-8 bytes, lexicographic compare.
#[derive(Copy, Clone, Debug, Default)]
pub struct StrHash;

impl KeyHasher<str> for StrHash {
    #[inline]
    fn hash(&self, key: &str) -> u64 {
        djb2(key.as_bytes())
    }

    #[inline]
    fn compare(&self, stored: &str, probe: &str) -> Ordering {
        stored.cmp(probe)
    }
}

impl<'a> KeyHasher<&'a str> for StrHash {
    #[inline]
    fn hash(&self, key: &&'a str) -> u64 {
        djb2(key.as_bytes())
    }

    #[inline]
    fn compare(&self, stored: &&'a str, probe: &&'a str) -> Ordering {
        stored.cmp(probe)
    }
}

/// Byte-buffer keys: [`djb2_xor`], exact byte equality.
#[derive(Copy, Clone, Debug, Default)]
pub struct BytesHash;

fn bytes_compare(stored: &[u8], probe: &[u8]) -> Ordering {
    if stored == probe {
        Ordering::Equal
    } else {
        stored.cmp(probe)
    }
}

impl KeyHasher<[u8]> for BytesHash {
    #[inline]
    fn hash(&self, key: &[u8]) -> u64 {
        djb2_xor(key)
    }

    fn compare(&self, stored: &[u8], probe: &[u8]) -> Ordering {
        bytes_compare(stored, probe)
    }
}

impl<'a> KeyHasher<&'a [u8]> for BytesHash {
    #[inline]
    fn hash(&self, key: &&'a [u8]) -> u64 {
        djb2_xor(key)
    }

    fn compare(&self, stored: &&'a [u8], probe: &&'a [u8]) -> Ordering {
        bytes_compare(stored, probe)
    }
}

impl<const N: usize> KeyHasher<[u8; N]> for BytesHash {
    #[inline]
    fn hash(&self, key: &[u8; N]) -> u64 {
        djb2_xor(key)
    }

    fn compare(&self, stored: &[u8; N], probe: &[u8; N]) -> Ordering {
        bytes_compare(stored, probe)
    }
}

/// Any `Hash + Eq` key through a `BuildHasher`.
#[derive(Clone, Debug, Default)]
pub struct StdHash<S = DefaultHashBuilder>(S);

impl StdHash {
    pub fn new() -> Self {
        StdHash(DefaultHashBuilder::default())
    }
}

impl<S: BuildHasher> StdHash<S> {
    pub fn with_hasher(hasher: S) -> Self {
        StdHash(hasher)
    }
}

impl<Q, S> KeyHasher<Q> for StdHash<S>
where
    Q: ?Sized + Hash + Eq,
    S: BuildHasher,
{
    #[inline]
    fn hash(&self, key: &Q) -> u64 {
        self.0.hash_one(key)
    }

    #[inline]
    fn compare(&self, stored: &Q, probe: &Q) -> Ordering {
        if stored == probe {
            Ordering::Equal
        } else {
            Ordering::Less
        }
    }
}

/// A pair of caller-supplied hash and compare functions.
pub struct FnHasher<Q: ?Sized, F, C> {
    hash_fn: F,
    cmp_fn: C,
    _pd: PhantomData<fn(&Q)>,
}

impl<Q, F, C> FnHasher<Q, F, C>
where
    Q: ?Sized,
    F: Fn(&Q) -> u64,
    C: Fn(&Q, &Q) -> Ordering,
{
    pub fn new(hash_fn: F, cmp_fn: C) -> Self {
        FnHasher {
            hash_fn,
            cmp_fn,
            _pd: PhantomData,
        }
    }
}

impl<Q: ?Sized, F, C> fmt::Debug for FnHasher<Q, F, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnHasher")
    }
}

impl<Q, F, C> KeyHasher<Q> for FnHasher<Q, F, C>
where
    Q: ?Sized,
    F: Fn(&Q) -> u64,
    C: Fn(&Q, &Q) -> Ordering,
{
    #[inline]
    fn hash(&self, key: &Q) -> u64 {
        (self.hash_fn)(key)
    }

    #[inline]
    fn compare(&self, stored: &Q, probe: &Q) -> Ordering {
        (self.cmp_fn)(stored, probe)
    }
}
