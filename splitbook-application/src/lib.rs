#![warn(clippy::uninlined_format_args)]

pub mod error;
pub mod ledger_service;
pub mod model;
pub mod ports;

pub use error::{LedgerError, RecordDecodeError, StoreError};
pub use ledger_service::LedgerService;
pub use model::{ExpenseDraft, LedgerReport, SettlementStatus};
pub use ports::{LoadedRecords, RecordStore, StoreVersion};
