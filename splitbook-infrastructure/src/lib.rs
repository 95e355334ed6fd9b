#![warn(clippy::uninlined_format_args)]

pub mod csv_store;
pub mod memory_store;
pub mod record_codec;

pub use csv_store::CsvRecordStore;
pub use memory_store::InMemoryRecordStore;
pub use record_codec::ShareCellError;
