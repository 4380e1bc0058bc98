//! Bucket-count sequence and the density rule that walks it.

use crate::error::TableError;

#[cfg(target_pointer_width = "64")]
const PRIMES: [usize; 37] = [
    37,
    79,
    181,
    359,
    743,
    1511,
    3023,
    6037,
    12073,
    24001,
    48017,
    96001,
    192007,
    384001,
    768013,
    1536011,
    3072001,
    6144001,
    12288011,
    24576001,
    49152001,
    98304053,
    196608007,
    393216007,
    786432001,
    1572864001,
    3145728023,
    6291456071,
    12582912157,
    25165824377,
    50331648797,
    100663297627,
    201326595259,
    402653190619,
    805306381259,
    1610612762543,
    3221225525093,
];

#[cfg(not(target_pointer_width = "64"))]
const PRIMES: [usize; 27] = [
    37, 79, 181, 359, 743, 1511, 3023, 6037, 12073, 24001, 48017, 96001, 192007, 384001, 768013,
    1536011, 3072001, 6144001, 12288011, 24576001, 49152001, 98304053, 196608007, 393216007,
    786432001, 1572864001, 3145728023,
];

/// Ascending, roughly doubling primes; `SEQUENCE[level]` is the bucket count
/// at that level.
pub const SEQUENCE: &[usize] = &PRIMES;

/// Highest level a table can reach. Past it, density is allowed to grow
/// without bound.
pub const MAX_LEVEL: usize = PRIMES.len() - 1;

#[inline]
pub fn bucket_count(level: usize) -> usize {
    SEQUENCE[level]
}

/// Density thresholds. A table at `density <= shrink_at` steps down a level,
/// one at `density >= grow_at` steps up.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DensityBounds {
    shrink_at: f64,
    grow_at: f64,
}

impl DensityBounds {
    pub const DEFAULT: DensityBounds = DensityBounds {
        shrink_at: 0.25,
        grow_at: 2.0,
    };

    /// `grow_at` must be at least four times `shrink_at`, so a single step in
    /// either direction lands strictly inside the band, and at least `1.0`,
    /// so a handful of entries cannot push the table up the sequence.
    pub fn new(shrink_at: f64, grow_at: f64) -> Result<Self, TableError> {
        if !shrink_at.is_finite() || !grow_at.is_finite() {
            return Err(TableError::InvalidArgument("density bounds must be finite"));
        }
        if shrink_at < 0.0 || grow_at <= 0.0 {
            return Err(TableError::InvalidArgument("density bounds must be positive"));
        }
        if grow_at < 1.0 {
            return Err(TableError::InvalidArgument(
                "grow threshold must be at least one entry per bucket",
            ));
        }
        if grow_at < shrink_at * 4.0 {
            return Err(TableError::InvalidArgument(
                "grow threshold must be at least four times the shrink threshold",
            ));
        }
        Ok(DensityBounds { shrink_at, grow_at })
    }

    pub fn shrink_at(&self) -> f64 {
        self.shrink_at
    }

    pub fn grow_at(&self) -> f64 {
        self.grow_at
    }

    /// Level the table should move to, if any. Moves one step at a time.
    pub(crate) fn next_level(&self, level: usize, entries: usize) -> Option<usize> {
        let density = entries as f64 / bucket_count(level) as f64;
        if level > 0 && density <= self.shrink_at {
            Some(level - 1)
        } else if level < MAX_LEVEL && density >= self.grow_at {
            Some(level + 1)
        } else {
            None
        }
    }
}

impl Default for DensityBounds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Outcome of one density-maintenance step, in bucket counts.
///
/// Maintenance is best effort: an abandoned resize leaves the table valid at
/// its previous size and is never reported as an error of the operation that
/// triggered it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Maintenance {
    Steady,
    Grew { from: usize, to: usize },
    Shrank { from: usize, to: usize },
    Abandoned { from: usize, to: usize },
}

impl Maintenance {
    pub fn resized(&self) -> bool {
        matches!(self, Maintenance::Grew { .. } | Maintenance::Shrank { .. })
    }
}
