//! Table configuration.

use crate::error::TableError;
use crate::hashing::KeyHasher;
use crate::levels::DensityBounds;
use crate::ownership::Ownership;
use crate::table::Table;

/// Collects the policies and thresholds a table is fixed to for its
/// lifetime. The hash policy is required; `build` rejects a builder without
/// one.
///
/// ```
/// use chainmap::hashing::IntHash;
/// use chainmap::ownership::{owned_str, Inline};
/// use chainmap::TableBuilder;
///
/// let mut t = TableBuilder::new(Inline::<u32>::new(), owned_str())
///     .hasher(IntHash)
///     .density(0.25, 2.0)
///     .build()
///     .unwrap();
/// t.set(&1, Some("one")).unwrap();
/// assert_eq!(t.get(&1), Some("one"));
/// ```
#[derive(Debug)]
pub struct TableBuilder<K, V, H> {
    keys: K,
    values: V,
    hasher: Option<H>,
    density: (f64, f64),
}

impl<K, V, H> TableBuilder<K, V, H>
where
    K: Ownership,
    V: Ownership,
    H: KeyHasher<K::View>,
{
    pub fn new(keys: K, values: V) -> Self {
        let bounds = DensityBounds::default();
        TableBuilder {
            keys,
            values,
            hasher: None,
            density: (bounds.shrink_at(), bounds.grow_at()),
        }
    }

    pub fn hasher(mut self, hasher: H) -> Self {
        self.hasher = Some(hasher);
        self
    }

    /// Load factors at which the table steps down (`shrink_at`) or up
    /// (`grow_at`) a level. Checked by `build`.
    pub fn density(mut self, shrink_at: f64, grow_at: f64) -> Self {
        self.density = (shrink_at, grow_at);
        self
    }

    pub fn build(self) -> Result<Table<K, V, H>, TableError> {
        let hasher = self
            .hasher
            .ok_or(TableError::InvalidArgument("a hash policy is required"))?;
        let bounds = DensityBounds::new(self.density.0, self.density.1)?;
        Table::with_bounds(hasher, self.keys, self.values, bounds)
    }
}
