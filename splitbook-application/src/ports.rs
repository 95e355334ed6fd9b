use crate::error::{RecordDecodeError, StoreError};
use splitbook_domain::ExpenseRecord;
use std::fmt;

/// Identifies one observed state of a record store.
///
/// Two reads return the same version only if no row was added, removed or
/// rewritten in between.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct StoreVersion {
    pub rows: u64,
    pub digest: u64,
}

impl StoreVersion {
    pub const EMPTY: Self = Self { rows: 0, digest: 0 };
}

impl fmt::Display for StoreVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:016x}", self.rows, self.digest)
    }
}

/// Every stored row, decoded independently so one corrupt row cannot hide the rest.
#[derive(Debug, Default)]
pub struct LoadedRecords {
    pub version: StoreVersion,
    pub rows: Vec<Result<ExpenseRecord, RecordDecodeError>>,
}

pub trait RecordStore: Send + Sync {
    /// Reads all rows in storage order. A store with no data yet yields no
    /// rows and [`StoreVersion::EMPTY`], never an error.
    fn load_records(&self) -> Result<LoadedRecords, StoreError>;

    /// Appends `record` only if the store is still at `expected`, returning
    /// the new version. A mismatch fails with [`StoreError::Conflict`] and
    /// writes nothing.
    fn append_record(
        &self,
        record: &ExpenseRecord,
        expected: StoreVersion,
    ) -> Result<StoreVersion, StoreError>;

    fn version(&self) -> Result<StoreVersion, StoreError> {
        self.load_records().map(|loaded| loaded.version)
    }
}
