use std::path::PathBuf;

use ammo_core::storage::{SqliteStorage, StorageEngine};

use crate::app::{resolve_config_path, AppContext};
use crate::cli::InitArgs;
use crate::config::{default_ledger_path, parse_timezone, write_config, AmmoConfig};
use crate::ui::{hint, print, receipt};

pub fn handle_init(ctx: &AppContext, args: &InitArgs) -> anyhow::Result<()> {
    let target = match args.path.as_deref().or(ctx.explicit_ledger()) {
        Some(path) => PathBuf::from(path),
        None => default_ledger_path()?,
    };
    let timezone = match args.timezone.as_deref() {
        Some(value) => parse_timezone(value)?,
        None => None,
    };

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!("Failed to create ledger directory {}: {}", parent.display(), e)
        })?;
    }
    SqliteStorage::create(&target)?;

    let config_path = match args.config_path.as_deref() {
        Some(path) => PathBuf::from(path),
        None => resolve_config_path()?,
    };
    write_config(&config_path, &AmmoConfig::new(&target, timezone.clone()))?;

    if !ctx.quiet() {
        let ui = ctx.ui_context(false, None);
        let items = [
            ("Ledger", target.display().to_string()),
            ("Config", config_path.display().to_string()),
            ("Timezone", timezone.unwrap_or_else(|| "UTC".to_string())),
        ];
        print(&ui, &receipt(&ui, "Initialized new ledger", &items));
        print(
            &ui,
            &hint(&ui, "ammo master add bullet_type bullet_type=9mm category=handgun"),
        );
    }
    Ok(())
}
