//! # Ammo Core
//!
//! Core library for Ammo - an ammunition inventory ledger.
//!
//! Stock is never stored. The crate keeps an append-only log of signed
//! movements plus four reference tables, and folds the log into per-usage
//! totals on demand.
//!
//! ## Architecture
//!
//! - **storage**: Storage engine trait and the SQLite backend
//! - **resolver**: Category lookup from the item-type table
//! - **composer**: Intents to ledger records (transfers become two legs)
//! - **inventory**: Folding the log into current totals
//! - **service**: Presentation operations over an injected store
//! - **import**: CSV exchange with legacy sheet exports

pub mod composer;
pub mod dates;
pub mod error;
pub mod import;
pub mod inventory;
pub mod resolver;
pub mod service;
pub mod storage;

pub use composer::{compose, Intent, Mode, RegisterRequest};
pub use error::{AmmoError, Result};
pub use inventory::{aggregate, Inventory, InventoryKey};
pub use resolver::{resolve_category, CategoryResolver};
pub use service::{MainRow, MetaData, RecordUpdate, Service};
pub use storage::{SqliteStorage, StorageEngine};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
