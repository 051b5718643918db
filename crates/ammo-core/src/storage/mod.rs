//! Storage abstractions and the SQLite backend.

mod sqlite;
pub mod traits;
pub mod types;

pub use sqlite::{SqliteStorage, FORMAT_VERSION};
pub use traits::StorageEngine;
pub use types::{
    dimension_fields, DateBounds, DimensionRecord, DimensionTable, Entry, LedgerMetadata,
    Position, TransactionFilter, TransactionRecord,
};
