//! UI primitives for the Ammo CLI.
//!
//! - **Context**: Environment detection (TTY, color, unicode)
//! - **Mode**: Output mode resolution (json, plain, pretty)
//! - **Render**: Tables, key-value lines, hints, errors

mod context;
mod mode;
pub mod render;

pub use context::UiContext;

pub use render::{hint, print, print_error, receipt, table, Column};
