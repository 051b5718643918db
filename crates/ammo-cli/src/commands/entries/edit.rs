use ammo_core::dates::format_timestamp;
use ammo_core::storage::{Entry, Position, TransactionFilter};
use ammo_core::{AmmoError, RecordUpdate};
use uuid::Uuid;

use crate::app::AppContext;
use crate::cli::EditArgs;
use crate::ui::{print, receipt};

/// How the row to edit was addressed.
enum Target {
    Position(Position),
    Id(Uuid),
}

impl Target {
    fn parse(raw: &str) -> ammo_core::Result<Self> {
        match Uuid::parse_str(raw.trim()) {
            Ok(id) => Ok(Self::Id(id)),
            Err(_) => raw.parse().map(Self::Position),
        }
    }

    fn find(&self, entries: Vec<Entry>) -> ammo_core::Result<Entry> {
        let found = entries.into_iter().find(|entry| match self {
            Self::Position(position) => entry.position == position.index(),
            Self::Id(id) => entry.id == *id,
        });
        found.ok_or_else(|| match self {
            Self::Position(position) => {
                AmmoError::NotFound(format!("No transaction at position {}", position))
            }
            Self::Id(id) => AmmoError::TransactionNotFound(*id),
        })
    }
}

/// A given flag replaces the stored value; an empty one clears it.
fn overlay(flag: &Option<String>, stored: Option<String>) -> Option<String> {
    match flag.as_deref() {
        None => stored,
        Some(value) if value.trim().is_empty() => None,
        Some(value) => Some(value.to_string()),
    }
}

fn overlay_quantity(flag: &Option<String>, stored: Option<i64>) -> anyhow::Result<Option<i64>> {
    match flag.as_deref().map(str::trim) {
        None => Ok(stored),
        Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| {
            AmmoError::InvalidInput(format!("Quantity must be a whole number: {}", value)).into()
        }),
    }
}

/// Overlay the flags that were given on the stored values.
fn merged_update(existing: Entry, args: &EditArgs) -> anyhow::Result<RecordUpdate> {
    let record = existing.record;
    let type_changed = args.bullet_type.is_some();
    // A stored category belongs to the old type; drop it when the type changes.
    let stored_category = if type_changed { None } else { record.category };
    Ok(RecordUpdate {
        date: args
            .date
            .clone()
            .or_else(|| record.date.as_ref().map(format_timestamp)),
        usage: args.usage.clone().unwrap_or(record.usage),
        bullet_type: overlay(&args.bullet_type, record.bullet_type),
        category: overlay(&args.category, stored_category),
        quantity: overlay_quantity(&args.quantity, record.quantity)?,
        place: overlay(&args.place, record.place),
        gun: overlay(&args.gun, record.gun),
        note: overlay(&args.note, record.note),
    })
}

pub fn handle_edit(ctx: &AppContext, args: &EditArgs) -> anyhow::Result<()> {
    let target = Target::parse(&args.target)?;

    let mut service = ctx.open_service()?;
    let existing = target.find(service.entries(&TransactionFilter::new())?)?;
    let position = existing.position;
    let update = merged_update(existing, args)?;

    let id = match target {
        Target::Position(position) => service.update_main_record(position, update)?,
        Target::Id(id) => {
            service.update_record_by_id(&id, update)?;
            id
        }
    };
    ctx.close_service(service)?;

    if !ctx.quiet() {
        let ui = ctx.ui_context(false, None);
        let items = [("Position", position.to_string()), ("ID", id.to_string())];
        print(&ui, &receipt(&ui, "Updated transaction", &items));
    }
    Ok(())
}
