use std::io::{self, Read};

use ammo_core::{Mode, RegisterRequest};
use uuid::Uuid;

use crate::app::AppContext;
use crate::cli::{EventArgs, MovementArgs, RegisterArgs, TransferArgs};
use crate::errors::CliError;
use crate::output::print_json;
use crate::ui::{print, receipt};

fn movement_request(mode: Mode, args: &MovementArgs, quantity: i64) -> RegisterRequest {
    RegisterRequest {
        mode: Some(mode.as_str().to_string()),
        date: args.date.clone(),
        usage: Some(args.usage.clone()),
        bullet_type: Some(args.bullet_type.clone()),
        category: args.category.clone(),
        quantity: Some(quantity),
        place: args.place.clone(),
        gun: args.gun.clone(),
        results: args.note.clone(),
        ..RegisterRequest::default()
    }
}

fn submit(ctx: &AppContext, request: RegisterRequest, json: bool) -> anyhow::Result<()> {
    let mode = Mode::from_label(request.mode.as_deref());
    let mut service = ctx.open_service()?;
    let ids = service.register_data(request)?;
    ctx.close_service(service)?;

    if json {
        return print_json(&ids);
    }
    if !ctx.quiet() {
        let ui = ctx.ui_context(false, None);
        let items: Vec<(&str, String)> = ids.iter().map(|id: &Uuid| ("ID", id.to_string())).collect();
        print(&ui, &receipt(&ui, &format!("Recorded {}", mode.as_str()), &items));
    }
    Ok(())
}

pub fn handle_purchase(ctx: &AppContext, args: &MovementArgs) -> anyhow::Result<()> {
    submit(ctx, movement_request(Mode::Purchase, args, args.quantity), args.json)
}

/// Consumption is stored as a negative quantity whatever sign was typed.
pub fn handle_consume(ctx: &AppContext, args: &MovementArgs) -> anyhow::Result<()> {
    let quantity = args
        .quantity
        .checked_abs()
        .map(|q| -q)
        .ok_or_else(|| CliError::invalid_input(format!("Quantity out of range: {}", args.quantity)))?;
    submit(ctx, movement_request(Mode::Consumption, args, quantity), args.json)
}

pub fn handle_event(ctx: &AppContext, args: &EventArgs) -> anyhow::Result<()> {
    let request = RegisterRequest {
        mode: Some(Mode::Event.as_str().to_string()),
        date: args.date.clone(),
        usage: Some(args.usage.clone()),
        bullet_type: args.bullet_type.clone(),
        category: args.category.clone(),
        quantity: args.quantity,
        place: args.place.clone(),
        gun: args.gun.clone(),
        results: args.note.clone(),
        ..RegisterRequest::default()
    };
    submit(ctx, request, args.json)
}

pub fn handle_transfer(ctx: &AppContext, args: &TransferArgs) -> anyhow::Result<()> {
    let request = RegisterRequest {
        mode: Some(Mode::Transfer.as_str().to_string()),
        date: args.date.clone(),
        bullet_type: Some(args.bullet_type.clone()),
        quantity: Some(args.quantity),
        gun: args.gun.clone(),
        from_use: Some(args.from.clone()),
        to_use: Some(args.to.clone()),
        ..RegisterRequest::default()
    };
    submit(ctx, request, args.json)
}

/// Register a JSON intent given inline or on stdin.
pub fn handle_register(ctx: &AppContext, args: &RegisterArgs) -> anyhow::Result<()> {
    let raw = match args.payload.as_deref() {
        Some(text) if text != "-" => text.to_string(),
        _ => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    let request: RegisterRequest = serde_json::from_str(&raw)
        .map_err(|e| CliError::invalid_input(format!("Invalid intent JSON: {}", e)))?;
    submit(ctx, request, args.json)
}
