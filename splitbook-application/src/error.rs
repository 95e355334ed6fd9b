use crate::ports::StoreVersion;
use splitbook_domain::{Member, Money, ShareError};
use thiserror::Error;

/// A stored row that could not be turned back into an expense record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("row {row}: {reason}")]
pub struct RecordDecodeError {
    /// 1-based data row, header excluded.
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("ledger changed since it was read (expected {expected}, found {actual})")]
    Conflict {
        expected: StoreVersion,
        actual: StoreVersion,
    },
    #[error("ledger storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode record: {0}")]
    Encode(String),
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("description and total amount are required")]
    IncompleteDraft,
    #[error("amounts must not be negative (got {0})")]
    NegativeAmount(Money),
    #[error("payer '{0}' is not a registered member")]
    UnknownPayer(Member),
    #[error(transparent)]
    Share(#[from] ShareError),
    #[error("ledger was modified by someone else (expected {expected}, found {actual})")]
    Conflict {
        expected: StoreVersion,
        actual: StoreVersion,
    },
    #[error(transparent)]
    Store(StoreError),
}

impl LedgerError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { expected, actual } => Self::Conflict { expected, actual },
            other => Self::Store(other),
        }
    }
}
