//! Error kinds surfaced by table operations.

use core::fmt;
use std::collections::TryReserveError;

/// Failure of a table operation. A failed operation has no visible effect on
/// the table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TableError {
    /// The bucket array, the entry arena or a policy copy could not obtain
    /// storage.
    AllocationFailure,
    /// Rejected configuration, reported before anything is allocated.
    InvalidArgument(&'static str),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TableError::AllocationFailure => f.write_str("allocation failure"),
            TableError::InvalidArgument(what) => write!(f, "invalid argument: {}", what),
        }
    }
}

impl std::error::Error for TableError {}

impl From<TryReserveError> for TableError {
    fn from(_: TryReserveError) -> Self {
        TableError::AllocationFailure
    }
}
