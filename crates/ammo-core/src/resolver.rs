//! Category lookup against the `bullet_type` reference table.

use crate::error::Result;
use crate::storage::{DimensionRecord, DimensionTable, StorageEngine};

const CODE_COLUMN: &str = "bullet_type";
const CATEGORY_COLUMN: &str = "category";

/// Category of the first row whose code equals `bullet_type`, or `""`.
pub fn resolve_category(bullet_types: &[DimensionRecord], bullet_type: &str) -> String {
    if bullet_type.is_empty() {
        return String::new();
    }
    bullet_types
        .iter()
        .find(|row| row.get(CODE_COLUMN) == bullet_type)
        .map(|row| row.get(CATEGORY_COLUMN).to_string())
        .unwrap_or_default()
}

/// Snapshot of the item-type table used to enrich written records.
#[derive(Debug, Clone, Default)]
pub struct CategoryResolver {
    rows: Vec<DimensionRecord>,
}

impl CategoryResolver {
    pub fn new(rows: Vec<DimensionRecord>) -> Self {
        Self { rows }
    }

    /// Load the current `bullet_type` table from storage.
    pub fn load<S: StorageEngine>(storage: &S) -> Result<Self> {
        Ok(Self::new(storage.list_dimension(DimensionTable::BulletType)?))
    }

    pub fn resolve(&self, bullet_type: &str) -> String {
        resolve_category(&self.rows, bullet_type)
    }

    /// Category to store for a written record.
    ///
    /// The looked-up category wins; the caller's value is used only when the
    /// item type is absent or has no category of its own.
    pub fn enrich(&self, bullet_type: Option<&str>, supplied: Option<&str>) -> String {
        let resolved = bullet_type.map(|code| self.resolve(code)).unwrap_or_default();
        if !resolved.is_empty() {
            return resolved;
        }
        supplied.unwrap_or_default().to_string()
    }
}
