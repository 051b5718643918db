use std::fs::File;
use std::io::{self, BufReader, Read};

use ammo_core::StorageEngine;

use crate::app::AppContext;
use crate::cli::ImportArgs;
use crate::errors::CliError;
use crate::ui::{print, receipt};

pub fn handle_check(ctx: &AppContext) -> anyhow::Result<()> {
    let service = ctx.open_service()?;
    match service.storage().check_integrity() {
        Ok(()) => {
            if !ctx.quiet() {
                println!("Integrity check: OK");
                println!("- sqlite: OK");
                println!("- metadata keys: OK");
                println!("- row ids: OK");
            }
        }
        Err(err) => {
            eprintln!("Integrity check: FAILED");
            eprintln!("- error: {}", err);
            eprintln!("Hint: Export what is readable with `ammo export --format csv` before repairing.");
            return Err(CliError::IntegrityFailed("Integrity check failed".to_string()).into());
        }
    }
    ctx.close_service(service)
}

pub fn handle_import(ctx: &AppContext, args: &ImportArgs) -> anyhow::Result<()> {
    let reader: Box<dyn Read> = if args.file == "-" {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(&args.file).map_err(|e| {
            CliError::not_found(format!("Cannot open {}: {}", args.file, e), "")
        })?;
        Box::new(BufReader::new(file))
    };

    let mut service = ctx.open_service()?;
    let report = service.import_csv(reader)?;
    ctx.close_service(service)?;

    if !ctx.quiet() {
        let ui = ctx.ui_context(false, None);
        let items = [
            ("Imported", report.imported().to_string()),
            ("Skipped", report.skipped.to_string()),
        ];
        print(&ui, &receipt(&ui, "Import finished", &items));
    }
    Ok(())
}
