//! Ammo CLI - an ammunition inventory ledger
//!
//! This is the command-line interface for Ammo. It exposes the core
//! presentation operations as subcommands.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod output;
mod ui;

use clap::{CommandFactory, Parser};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::app::AppContext;
use crate::cli::{Cli, Commands};
use crate::commands::{entries, init, inventory, maintenance, master, misc};
use crate::constants::{LOG_ENV, LOG_FORMAT_ENV};
use crate::errors::exit_code_for;
use crate::ui::print_error;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let ctx = AppContext::new(&cli);

    if let Err(e) = run(&ctx, &cli) {
        let ui_ctx = ctx.ui_context(false, None);
        let error_msg = format!("{}", e);
        let (message, hint) = split_hint(&error_msg);
        print_error(&ui_ctx, message, hint);
        std::process::exit(exit_code_for(&e));
    }
}

/// Logs go to stderr so they never mix with command output.
fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "ammo_core=warn,ammo_cli=warn",
            1 => "ammo_core=debug,ammo_cli=debug,warn",
            _ => "ammo_core=trace,ammo_cli=trace,info",
        })
    });

    let format = std::env::var(LOG_FORMAT_ENV).unwrap_or_else(|_| "compact".to_string());
    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Split a trailing "Hint: ..." line off an error message.
fn split_hint(error: &str) -> (&str, Option<&str>) {
    match error.find("\nHint:") {
        Some(idx) => (&error[..idx], Some(&error[idx + 1..])),
        None => (error, None),
    }
}

fn run(ctx: &AppContext, cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Some(Commands::Init(args)) => init::handle_init(ctx, args),
        Some(Commands::Purchase(args)) => entries::handle_purchase(ctx, args),
        Some(Commands::Consume(args)) => entries::handle_consume(ctx, args),
        Some(Commands::Event(args)) => entries::handle_event(ctx, args),
        Some(Commands::Transfer(args)) => entries::handle_transfer(ctx, args),
        Some(Commands::Register(args)) => entries::handle_register(ctx, args),
        Some(Commands::List(args)) => entries::handle_list(ctx, args),
        Some(Commands::Inventory(args)) => inventory::handle_inventory(ctx, args),
        Some(Commands::Meta) => inventory::handle_meta(ctx),
        Some(Commands::Edit(args)) => entries::handle_edit(ctx, args),
        Some(Commands::Delete(args)) => entries::handle_delete(ctx, args),
        Some(Commands::Master(command)) => master::handle_master(ctx, command),
        Some(Commands::Import(args)) => maintenance::handle_import(ctx, args),
        Some(Commands::Export(args)) => entries::handle_export(ctx, args),
        Some(Commands::Check) => maintenance::handle_check(ctx),
        Some(Commands::Completions(args)) => misc::handle_completions(args.shell),
        None => {
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}
