//! Storage engine trait definition.
//!
//! The `StorageEngine` trait is the narrow contract the core uses to reach
//! its persistence substrate: the transaction log and the four reference
//! tables. Services receive an engine explicitly; nothing in the core
//! reaches for a global handle.

use std::collections::BTreeMap;
use std::path::Path;

use uuid::Uuid;

use super::types::{
    DimensionRecord, DimensionTable, Entry, LedgerMetadata, Position, TransactionFilter,
    TransactionRecord,
};
use crate::error::{AmmoError, Result};

/// Storage engine interface for the ammunition ledger.
///
/// All implementations must ensure:
/// - Insertion order is preserved for transactions and dimension rows
/// - Every stored row carries a stable UUID
/// - Batch appends are all-or-nothing
pub trait StorageEngine {
    /// Create a new ledger at the specified path.
    ///
    /// # Errors
    ///
    /// Returns `AmmoError::Storage` if the file already exists or cannot be
    /// written.
    fn create(path: &Path) -> Result<()>
    where
        Self: Sized;

    /// Open an existing ledger.
    ///
    /// # Errors
    ///
    /// Returns `AmmoError::LedgerNotFound` if the file does not exist.
    fn open(path: &Path) -> Result<Self>
    where
        Self: Sized;

    /// Close the ledger, releasing the underlying handle.
    fn close(self) -> Result<()>;

    /// Get ledger metadata.
    fn metadata(&self) -> Result<LedgerMetadata>;

    // --- Transaction operations ---

    /// Append records at the end of the log as one atomic batch.
    ///
    /// # Returns
    ///
    /// Returns the generated IDs, in the same order as `records`.
    fn append_transactions(&mut self, records: &[TransactionRecord]) -> Result<Vec<Uuid>>;

    /// Append a single record.
    fn append_transaction(&mut self, record: &TransactionRecord) -> Result<Uuid> {
        let ids = self.append_transactions(std::slice::from_ref(record))?;
        ids.into_iter()
            .next()
            .ok_or_else(|| AmmoError::Storage("Append returned no ID".to_string()))
    }

    /// List transactions in storage order, tagged with their positions.
    ///
    /// Positions are computed over the whole log before `filter` applies.
    fn list_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Entry>>;

    /// Get a transaction by ID.
    ///
    /// # Returns
    ///
    /// Returns `Ok(Some(entry))` if found, `Ok(None)` if not found.
    fn get_transaction(&self, id: &Uuid) -> Result<Option<Entry>>;

    /// Overwrite the transaction with the given ID.
    ///
    /// # Errors
    ///
    /// Returns `AmmoError::TransactionNotFound` if no row has this ID.
    fn update_transaction(&mut self, id: &Uuid, record: &TransactionRecord) -> Result<()>;

    /// Delete the transaction with the given ID.
    ///
    /// # Errors
    ///
    /// Returns `AmmoError::TransactionNotFound` if no row has this ID.
    fn delete_transaction(&mut self, id: &Uuid) -> Result<()>;

    /// Overwrite the transaction at `position`.
    ///
    /// # Errors
    ///
    /// Returns `AmmoError::NotFound` if the position is past the last row.
    fn update_transaction_at(
        &mut self,
        position: Position,
        record: &TransactionRecord,
    ) -> Result<Uuid>;

    /// Delete the transaction at `position`; later rows shift down by one.
    ///
    /// # Errors
    ///
    /// Returns `AmmoError::NotFound` if the position is past the last row.
    fn delete_transaction_at(&mut self, position: Position) -> Result<Uuid>;

    // --- Dimension operations ---

    /// List the rows of a reference table in storage order.
    fn list_dimension(&self, table: DimensionTable) -> Result<Vec<DimensionRecord>>;

    /// Append a row to a reference table. `fields` must hold every column.
    fn add_dimension(
        &mut self,
        table: DimensionTable,
        fields: &BTreeMap<String, String>,
    ) -> Result<Uuid>;

    /// Overwrite the reference row at `position`.
    fn update_dimension_at(
        &mut self,
        table: DimensionTable,
        position: Position,
        fields: &BTreeMap<String, String>,
    ) -> Result<Uuid>;

    /// Delete the reference row at `position`.
    fn delete_dimension_at(&mut self, table: DimensionTable, position: Position) -> Result<Uuid>;

    // --- Maintenance operations ---

    /// Check ledger integrity.
    ///
    /// Verifies:
    /// - SQLite page integrity
    /// - Required metadata keys
    /// - Transaction ID uniqueness
    fn check_integrity(&self) -> Result<()>;
}
