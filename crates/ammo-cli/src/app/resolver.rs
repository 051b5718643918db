//! Path resolution for config and ledger files.

use std::path::{Path, PathBuf};

use crate::config::{default_config_path, AmmoConfig};
use crate::constants::CONFIG_ENV;
use crate::errors::CliError;

/// Resolve the config file path, checking AMMO_CONFIG env var first.
pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var(CONFIG_ENV) {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

/// Resolve the ledger file path.
///
/// Precedence: `--ledger` / `AMMO_LEDGER_PATH`, then the config file.
pub fn resolve_ledger_path(
    explicit: Option<&str>,
    config: Option<&AmmoConfig>,
    config_path: &Path,
) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit.filter(|value| !value.trim().is_empty()) {
        return Ok(PathBuf::from(path));
    }

    match config {
        Some(config) => Ok(PathBuf::from(&config.ledger.path)),
        None => Err(CliError::not_found(
            format!("No config found at {}", config_path.display()),
            "Hint: Run `ammo init`, or pass --ledger / set AMMO_LEDGER_PATH.",
        )
        .into()),
    }
}

/// Error message when the ledger file is missing.
pub fn missing_ledger_message(path: &Path) -> String {
    format!("No ledger found at {}", path.display())
}
