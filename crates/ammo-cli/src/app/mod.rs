//! Application-level utilities for the Ammo CLI.
//!
//! This module provides:
//! - Path resolution for config and ledger files
//! - The per-invocation application context

mod context;
mod resolver;

pub use context::AppContext;
pub use resolver::{missing_ledger_message, resolve_config_path, resolve_ledger_path};
