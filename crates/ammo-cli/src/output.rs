//! Output formatting helpers for the CLI.

use ammo_core::storage::{DimensionRecord, DimensionTable};
use ammo_core::{Inventory, MainRow};
use serde::Serialize;

use crate::ui::{print, table, Column, UiContext};

const EMPTY_CELL: &str = "-";

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cell(value: &str) -> String {
    if value.is_empty() {
        EMPTY_CELL.to_string()
    } else {
        value.to_string()
    }
}

const MAIN_COLUMNS: [Column; 9] = [
    Column::numeric("#"),
    Column::new("Date"),
    Column::new("Use"),
    Column::new("Type"),
    Column::new("Category"),
    Column::numeric("Qty"),
    Column::new("Place"),
    Column::new("Gun"),
    Column::new("Note"),
];

/// Table cells for transaction rows.
pub fn main_row_cells(rows: &[MainRow]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            vec![
                row.position.to_string(),
                cell(&row.date),
                cell(&row.usage),
                cell(&row.bullet_type),
                cell(&row.category),
                row.quantity
                    .map(|q| q.to_string())
                    .unwrap_or_else(|| EMPTY_CELL.to_string()),
                cell(&row.place),
                cell(&row.gun),
                cell(&row.note),
            ]
        })
        .collect()
}

/// Print transaction rows in the context's mode.
pub fn print_main_rows(ctx: &UiContext, rows: &[MainRow]) -> anyhow::Result<()> {
    if ctx.mode.is_json() {
        return print_json(rows);
    }
    if rows.is_empty() {
        if ctx.mode.is_pretty() {
            println!("No transactions.");
        }
        return Ok(());
    }
    print(ctx, &table(ctx, &MAIN_COLUMNS, &main_row_cells(rows)));
    Ok(())
}

/// Table cells for inventory lines.
pub fn inventory_cells(inventory: &Inventory) -> Vec<Vec<String>> {
    inventory
        .lines()
        .into_iter()
        .map(|line| {
            vec![
                line.key.usage,
                line.key.bullet_type,
                line.total.to_string(),
            ]
        })
        .collect()
}

/// Print inventory totals in the context's mode.
pub fn print_inventory(ctx: &UiContext, inventory: &Inventory) -> anyhow::Result<()> {
    if ctx.mode.is_json() {
        return print_json(&inventory.lines());
    }
    if inventory.is_empty() {
        if ctx.mode.is_pretty() {
            println!("No stock recorded.");
        }
        return Ok(());
    }
    let columns = [
        Column::new("Use"),
        Column::new("Type"),
        Column::numeric("Total"),
    ];
    print(ctx, &table(ctx, &columns, &inventory_cells(inventory)));
    Ok(())
}

/// Table cells for a reference table, position first.
pub fn dimension_cells(table_name: DimensionTable, rows: &[DimensionRecord]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            let mut cells = vec![row.position.to_string()];
            cells.extend(table_name.columns().iter().map(|column| cell(row.get(column))));
            cells
        })
        .collect()
}

/// Print a reference table in the context's mode.
pub fn print_dimension(
    ctx: &UiContext,
    table_name: DimensionTable,
    rows: &[DimensionRecord],
) -> anyhow::Result<()> {
    if ctx.mode.is_json() {
        return print_json(rows);
    }
    let mut columns = vec![Column::numeric("#")];
    columns.extend(table_name.columns().iter().map(|column| Column::new(*column)));
    print(ctx, &table(ctx, &columns, &dimension_cells(table_name, rows)));
    Ok(())
}
