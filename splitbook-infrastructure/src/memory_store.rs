use std::sync::{Mutex, PoisonError};

use splitbook_application::{
    LoadedRecords, RecordDecodeError, RecordStore, StoreError, StoreVersion,
};
use splitbook_domain::ExpenseRecord;

#[derive(Default)]
struct State {
    rows: Vec<Result<ExpenseRecord, RecordDecodeError>>,
    revision: u64,
}

impl State {
    fn version(&self) -> StoreVersion {
        if self.rows.is_empty() && self.revision == 0 {
            return StoreVersion::EMPTY;
        }
        StoreVersion {
            rows: self.rows.len() as u64,
            digest: self.revision,
        }
    }
}

/// Process-local record store, mainly for tests and dry runs.
#[derive(Default)]
pub struct InMemoryRecordStore {
    state: Mutex<State>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with already decoded (or undecodable) rows.
    pub fn with_rows(rows: Vec<Result<ExpenseRecord, RecordDecodeError>>) -> Self {
        let revision = u64::from(!rows.is_empty());
        Self {
            state: Mutex::new(State { rows, revision }),
        }
    }

    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .rows
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for InMemoryRecordStore {
    fn load_records(&self) -> Result<LoadedRecords, StoreError> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(LoadedRecords {
            version: state.version(),
            rows: state.rows.clone(),
        })
    }

    fn append_record(
        &self,
        record: &ExpenseRecord,
        expected: StoreVersion,
    ) -> Result<StoreVersion, StoreError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let actual = state.version();
        if actual != expected {
            return Err(StoreError::Conflict { expected, actual });
        }
        state.rows.push(Ok(record.clone()));
        state.revision += 1;
        Ok(state.version())
    }

    fn version(&self) -> Result<StoreVersion, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .version())
    }
}
