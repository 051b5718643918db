//! Core data types for the storage layer.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dates::{end_of_day, parse_date, start_of_day};
use crate::error::{AmmoError, Result};

/// Metadata for a ledger database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerMetadata {
    /// Format version (e.g., "1")
    pub format_version: String,

    /// When this ledger was created
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp (informational)
    pub last_modified: DateTime<Utc>,
}

/// One row of the transaction log.
///
/// The sign of `quantity` encodes direction: positive values add stock,
/// negative values remove it. Non-consuming events carry no quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// When the movement happened (wall-clock time)
    pub date: Option<NaiveDateTime>,

    /// Usage category the quantity is allocated to
    #[serde(rename = "use")]
    pub usage: String,

    /// Item-type code
    pub bullet_type: Option<String>,

    /// Category derived from the item-type dimension
    pub category: Option<String>,

    /// Signed quantity
    pub quantity: Option<i64>,

    /// Free-text place
    pub place: Option<String>,

    /// Gun used or assigned
    pub gun: Option<String>,

    /// Free-text note
    pub note: Option<String>,
}

impl TransactionRecord {
    pub fn new(usage: impl Into<String>) -> Self {
        Self {
            usage: usage.into(),
            ..Self::default()
        }
    }

    pub fn with_date(mut self, date: NaiveDateTime) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_bullet_type(mut self, bullet_type: impl Into<String>) -> Self {
        self.bullet_type = Some(bullet_type.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_place(mut self, place: impl Into<String>) -> Self {
        self.place = Some(place.into());
        self
    }

    pub fn with_gun(mut self, gun: impl Into<String>) -> Self {
        self.gun = Some(gun.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// A stored transaction, tagged with its stable ID and its current position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Stable identifier assigned at creation
    pub id: Uuid,

    /// Zero-based index among all rows, in insertion order
    pub position: usize,

    /// Row data
    #[serde(flatten)]
    pub record: TransactionRecord,
}

/// Inclusive date-range filter for listing transactions.
///
/// Bounds are kept as the raw strings the caller supplied. A bound that
/// cannot be parsed is ignored, and rows without a date always pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    /// Lower bound (start of day)
    pub start_date: Option<String>,

    /// Upper bound (end of day)
    pub end_date: Option<String>,
}

impl TransactionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_date(mut self, value: impl Into<String>) -> Self {
        self.start_date = Some(value.into());
        self
    }

    pub fn end_date(mut self, value: impl Into<String>) -> Self {
        self.end_date = Some(value.into());
        self
    }

    /// Resolve the parsed bounds, dropping anything unparseable.
    pub fn bounds(&self) -> DateBounds {
        DateBounds {
            start: self
                .start_date
                .as_deref()
                .and_then(parse_date)
                .map(|value| start_of_day(value.date())),
            end: self
                .end_date
                .as_deref()
                .and_then(parse_date)
                .map(|value| end_of_day(value.date())),
        }
    }
}

/// Parsed, inclusive date window of a [`TransactionFilter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateBounds {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl DateBounds {
    /// Whether the record falls inside the window; undated records always do.
    pub fn contains(&self, record: &TransactionRecord) -> bool {
        let Some(date) = record.date else {
            return true;
        };
        if self.start.is_some_and(|start| date < start) {
            return false;
        }
        if self.end.is_some_and(|end| date > end) {
            return false;
        }
        true
    }
}

/// Zero-based row position used by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position(usize);

impl Position {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for Position {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl TryFrom<i64> for Position {
    type Error = AmmoError;

    fn try_from(value: i64) -> Result<Self> {
        usize::try_from(value)
            .map(Self)
            .map_err(|_| AmmoError::InvalidPosition(value.to_string()))
    }
}

impl TryFrom<f64> for Position {
    type Error = AmmoError;

    fn try_from(value: f64) -> Result<Self> {
        if !value.is_finite() || value.fract() != 0.0 || value < 0.0 || value > u32::MAX as f64 {
            return Err(AmmoError::InvalidPosition(value.to_string()));
        }
        Ok(Self(value as usize))
    }
}

impl TryFrom<&serde_json::Value> for Position {
    type Error = AmmoError;

    fn try_from(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Number(number) => {
                if let Some(index) = number.as_u64() {
                    usize::try_from(index)
                        .map(Self)
                        .map_err(|_| AmmoError::InvalidPosition(number.to_string()))
                } else if let Some(signed) = number.as_i64() {
                    Self::try_from(signed)
                } else {
                    Self::try_from(number.as_f64().unwrap_or(f64::NAN))
                }
            }
            other => Err(AmmoError::InvalidPosition(other.to_string())),
        }
    }
}

impl FromStr for Position {
    type Err = AmmoError;

    fn from_str(value: &str) -> Result<Self> {
        value
            .trim()
            .parse::<i64>()
            .map_err(|_| AmmoError::InvalidPosition(value.to_string()))
            .and_then(Self::try_from)
    }
}

/// The four reference-data tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionTable {
    Gun,
    BulletType,
    Place,
    Use,
}

impl DimensionTable {
    pub const ALL: [DimensionTable; 4] = [
        DimensionTable::Gun,
        DimensionTable::BulletType,
        DimensionTable::Place,
        DimensionTable::Use,
    ];

    /// User-facing table name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gun => "gun",
            Self::BulletType => "bullet_type",
            Self::Place => "place",
            Self::Use => "use",
        }
    }

    /// Column names, in header order. The first column is the row's name.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Gun => &["gun", "type", "size"],
            Self::BulletType => &["bullet_type", "size", "type", "category"],
            Self::Place => &["place", "type"],
            Self::Use => &["use"],
        }
    }

    /// Column holding the row's name.
    pub fn key_column(self) -> &'static str {
        self.columns()[0]
    }

    /// Backing SQL table.
    pub(crate) fn sql_table(self) -> &'static str {
        match self {
            Self::Gun => "dim_gun",
            Self::BulletType => "dim_bullet_type",
            Self::Place => "dim_place",
            Self::Use => "dim_use",
        }
    }
}

impl fmt::Display for DimensionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DimensionTable {
    type Err = AmmoError;

    fn from_str(value: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|table| table.as_str() == value)
            .ok_or_else(|| AmmoError::InvalidTableName(value.to_string()))
    }
}

/// One reference-data row: a flat mapping of column name to text value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DimensionRecord {
    pub id: Uuid,

    /// Zero-based index within its table
    #[serde(rename = "rowIndex")]
    pub position: usize,

    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

impl DimensionRecord {
    /// Value of a column, or `""` when missing.
    pub fn get(&self, column: &str) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }
}

/// Build a full column map for `table` from a loose JSON payload.
///
/// Unknown keys are ignored, missing columns become `""`, and non-string
/// scalars are stringified.
pub fn dimension_fields(
    table: DimensionTable,
    payload: &serde_json::Map<String, serde_json::Value>,
) -> BTreeMap<String, String> {
    table
        .columns()
        .iter()
        .map(|column| {
            let value = match payload.get(*column) {
                None | Some(serde_json::Value::Null) => String::new(),
                Some(serde_json::Value::String(text)) => text.clone(),
                Some(other) => other.to_string(),
            };
            (column.to_string(), value)
        })
        .collect()
}
