//! Application context for the Ammo CLI.
//!
//! Bundles CLI arguments with the lazily-loaded config file.

use std::path::PathBuf;

use ammo_core::storage::{SqliteStorage, StorageEngine};
use ammo_core::{AmmoError, Service};
use chrono::Utc;
use chrono_tz::Tz;
use once_cell::unsync::OnceCell;

use crate::cli::Cli;
use crate::config::{read_config, AmmoConfig};
use crate::errors::CliError;
use crate::ui::UiContext;

use super::resolver::{missing_ledger_message, resolve_config_path, resolve_ledger_path};

/// Application context that bundles CLI args with configuration.
pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<Option<AmmoConfig>>,
}

impl<'a> AppContext<'a> {
    /// Create a new application context from CLI arguments.
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
        }
    }

    /// Check if quiet mode is enabled.
    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// Ledger path given by flag or environment, if any.
    pub fn explicit_ledger(&self) -> Option<&str> {
        self.cli.ledger.as_deref()
    }

    /// Get the config file contents, loading them lazily. A missing file is `None`.
    pub fn config(&self) -> anyhow::Result<Option<&AmmoConfig>> {
        let config = self.config.get_or_try_init(|| {
            let path = resolve_config_path()?;
            if !path.exists() {
                tracing::debug!(path = %path.display(), "no config file");
                return Ok::<_, anyhow::Error>(None);
            }
            read_config(&path).map(Some)
        })?;
        Ok(config.as_ref())
    }

    /// Resolve the ledger path from flags, env, or config.
    pub fn ledger_path(&self) -> anyhow::Result<PathBuf> {
        let config_path = resolve_config_path()?;
        resolve_ledger_path(self.explicit_ledger(), self.config()?, &config_path)
    }

    /// Zone used to stamp undated records.
    pub fn timezone(&self) -> anyhow::Result<Tz> {
        let configured = self
            .config()?
            .and_then(|config| config.ui.timezone.as_deref());
        match configured {
            None => Ok(Tz::UTC),
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| anyhow::anyhow!("Invalid timezone in config: {}", name)),
        }
    }

    /// Open the ledger and wrap it in a service stamping "now" in the configured zone.
    pub fn open_service(&self) -> anyhow::Result<Service<SqliteStorage>> {
        let path = self.ledger_path()?;
        let storage = SqliteStorage::open(&path).map_err(|err| match err {
            AmmoError::LedgerNotFound => anyhow::Error::new(CliError::not_found(
                missing_ledger_message(&path),
                "Hint: Run `ammo init` to create it.",
            )),
            other => anyhow::Error::new(other),
        })?;

        let tz = self.timezone()?;
        tracing::debug!(path = %path.display(), timezone = %tz, "ledger opened");
        Ok(Service::with_clock(
            storage,
            Box::new(move || Utc::now().with_timezone(&tz).naive_local()),
        ))
    }

    /// Close a service's store, flushing it to disk.
    pub fn close_service(&self, service: Service<SqliteStorage>) -> anyhow::Result<()> {
        service.into_storage().close()?;
        Ok(())
    }

    /// Build the UI context for a rendering command.
    pub fn ui_context(&self, json: bool, format: Option<&str>) -> UiContext {
        UiContext::from_env(json, format, self.cli.ascii)
    }
}
