//! Transaction row type for database queries.

use uuid::Uuid;

use crate::dates::parse_date;
use crate::error::{AmmoError, Result};
use crate::storage::types::{Entry, TransactionRecord};

/// Column list matching the field order of [`TransactionRow`].
pub const TRANSACTION_COLUMNS: &str =
    r#"id, date, "use", bullet_type, category, quantity, place, gun, note"#;

/// Raw row data from the transactions table, before parsing into domain types.
#[derive(Debug)]
pub struct TransactionRow {
    pub position: usize,
    pub id: String,
    pub date: Option<String>,
    pub usage: String,
    pub bullet_type: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<i64>,
    pub place: Option<String>,
    pub gun: Option<String>,
    pub note: Option<String>,
}

impl TransactionRow {
    /// Read a row selected with [`TRANSACTION_COLUMNS`].
    pub fn from_sql(position: usize, row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            position,
            id: row.get(0)?,
            date: row.get(1)?,
            usage: row.get(2)?,
            bullet_type: row.get(3)?,
            category: row.get(4)?,
            quantity: row.get(5)?,
            place: row.get(6)?,
            gun: row.get(7)?,
            note: row.get(8)?,
        })
    }
}

impl TryFrom<TransactionRow> for Entry {
    type Error = AmmoError;

    fn try_from(row: TransactionRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| AmmoError::Storage(format!("Invalid transaction UUID: {}", e)))?;
        let date = match row.date.as_deref() {
            None => None,
            Some(raw) => {
                let parsed = parse_date(raw);
                if parsed.is_none() {
                    tracing::warn!(%id, raw, "unparseable transaction date, treating as undated");
                }
                parsed
            }
        };

        Ok(Entry {
            id,
            position: row.position,
            record: TransactionRecord {
                date,
                usage: row.usage,
                bullet_type: row.bullet_type,
                category: row.category,
                quantity: row.quantity,
                place: row.place,
                gun: row.gun,
                note: row.note,
            },
        })
    }
}
