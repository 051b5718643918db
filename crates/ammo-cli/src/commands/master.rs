use ammo_core::storage::{DimensionTable, Position};
use serde_json::{json, Map, Value};

use crate::app::AppContext;
use crate::cli::{MasterSubcommand, ViewArgs};
use crate::errors::CliError;
use crate::output::print_dimension;
use crate::ui::{print, receipt};

/// Parse `column=value` pairs into a payload object.
pub fn parse_fields(fields: &[String]) -> anyhow::Result<Map<String, Value>> {
    let mut map = Map::new();
    for field in fields {
        let (column, value) = field.split_once('=').ok_or_else(|| {
            CliError::invalid_input(format!("Expected column=value, got: {}", field))
        })?;
        map.insert(column.trim().to_string(), Value::String(value.to_string()));
    }
    Ok(map)
}

pub fn handle_master(ctx: &AppContext, command: &MasterSubcommand) -> anyhow::Result<()> {
    match command {
        MasterSubcommand::List { table, view } => handle_list(ctx, table, view),
        MasterSubcommand::Add { table, fields } => {
            let payload = Value::Object(parse_fields(fields)?);
            apply(ctx, table, "add", &payload)
        }
        MasterSubcommand::Update {
            table,
            position,
            fields,
        } => {
            let position: Position = position.parse()?;
            let payload = json!({
                "rowIndex": position.index(),
                "values": Value::Object(parse_fields(fields)?),
            });
            apply(ctx, table, "update", &payload)
        }
        MasterSubcommand::Delete { table, position } => {
            let position: Position = position.parse()?;
            apply(ctx, table, "delete", &json!({ "rowIndex": position.index() }))
        }
    }
}

fn handle_list(ctx: &AppContext, table: &str, view: &ViewArgs) -> anyhow::Result<()> {
    let service = ctx.open_service()?;
    let rows = service.list_master(table)?;
    ctx.close_service(service)?;

    let table: DimensionTable = table.parse()?;
    let ui = ctx.ui_context(view.json, view.format.as_deref());
    print_dimension(&ui, table, &rows)
}

fn apply(ctx: &AppContext, table: &str, action: &str, payload: &Value) -> anyhow::Result<()> {
    let mut service = ctx.open_service()?;
    let id = service.update_master_data(table, action, payload)?;
    ctx.close_service(service)?;

    if !ctx.quiet() {
        let ui = ctx.ui_context(false, None);
        let items = [("Table", table.to_string()), ("Row", id.to_string())];
        print(&ui, &receipt(&ui, &format!("Reference row {}", past_tense(action)), &items));
    }
    Ok(())
}

fn past_tense(action: &str) -> &'static str {
    match action {
        "add" => "added",
        "update" => "updated",
        _ => "deleted",
    }
}
