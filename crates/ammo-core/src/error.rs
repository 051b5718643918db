//! Error types for Ammo core operations.
//!
//! This module defines the error hierarchy for all core operations.
//! Errors are descriptive at the core level; the CLI layer will map these
//! to user-friendly messages.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for Ammo operations.
pub type Result<T> = std::result::Result<T, AmmoError>;

/// Core error type for Ammo operations.
#[derive(Debug, Error)]
pub enum AmmoError {
    /// Mutation requested against a table outside the dimension set
    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    /// Negative or non-integer row position
    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    /// Ledger database not found
    #[error("Ledger file not found")]
    LedgerNotFound,

    /// Transaction not found by ID
    #[error("Transaction not found: {0}")]
    TransactionNotFound(Uuid),

    /// Generic resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage backend error (generic)
    #[error("Storage error: {0}")]
    Storage(String),

    /// SQLite-specific storage error
    #[error("SQLite error: {source}")]
    Sqlite {
        #[from]
        source: rusqlite::Error,
    },

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// CSV read/write error
    #[error("CSV error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },
}

impl AmmoError {
    /// Whether this error means the addressed resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AmmoError::LedgerNotFound | AmmoError::TransactionNotFound(_) | AmmoError::NotFound(_)
        )
    }

    /// Whether this error was caused by malformed caller input.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            AmmoError::InvalidTableName(_)
                | AmmoError::InvalidPosition(_)
                | AmmoError::Validation(_)
                | AmmoError::InvalidInput(_)
        )
    }
}
