use std::io;

use ammo_core::import::write_csv;

use super::list::date_filter;
use crate::app::AppContext;
use crate::cli::ExportArgs;
use crate::errors::CliError;

pub fn handle_export(ctx: &AppContext, args: &ExportArgs) -> anyhow::Result<()> {
    if !matches!(args.format.as_str(), "json" | "jsonl" | "csv") {
        return Err(CliError::invalid_input(format!(
            "Unsupported export format: {} (use json, jsonl or csv)",
            args.format
        ))
        .into());
    }

    let filter = date_filter(args.from.as_deref(), args.to.as_deref());
    let service = ctx.open_service()?;
    let entries = service.entries(&filter)?;
    ctx.close_service(service)?;

    match args.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        "jsonl" => {
            for entry in &entries {
                println!("{}", serde_json::to_string(entry)?);
            }
        }
        _ => {
            write_csv(io::stdout().lock(), &entries)?;
        }
    }
    Ok(())
}
