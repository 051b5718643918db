//! Current stock, folded from the transaction log.
//!
//! Totals are never stored. Every read folds the full log again, which keeps
//! them consistent with any point edit or delete.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::{AmmoError, Result};
use crate::storage::TransactionRecord;

/// Composite key of a stock total.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct InventoryKey {
    #[serde(rename = "use")]
    pub usage: String,
    pub bullet_type: String,
}

impl InventoryKey {
    pub fn new(usage: impl Into<String>, bullet_type: impl Into<String>) -> Self {
        Self {
            usage: usage.into(),
            bullet_type: bullet_type.into(),
        }
    }

    /// `use|bullet_type` label used in keyed output.
    pub fn label(&self) -> String {
        format!("{}|{}", self.usage, self.bullet_type)
    }
}

/// One line of an inventory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryLine {
    #[serde(flatten)]
    pub key: InventoryKey,
    pub total: i64,
}

/// Signed totals per (use, bullet type).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    totals: BTreeMap<InventoryKey, i64>,
}

impl Inventory {
    /// Total for a key; keys never seen are zero.
    pub fn get(&self, usage: &str, bullet_type: &str) -> i64 {
        self.totals
            .get(&InventoryKey::new(usage, bullet_type))
            .copied()
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Lines sorted by use, then bullet type.
    pub fn lines(&self) -> Vec<InventoryLine> {
        self.totals
            .iter()
            .map(|(key, total)| InventoryLine {
                key: key.clone(),
                total: *total,
            })
            .collect()
    }
}

impl Serialize for Inventory {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.totals.len()))?;
        for (key, total) in &self.totals {
            map.serialize_entry(&key.label(), total)?;
        }
        map.end()
    }
}

/// Fold records into per-(use, bullet type) totals.
///
/// Records without a use, without a bullet type, or without a quantity do
/// not count. A total that leaves the `i64` range is a `Validation` error.
pub fn aggregate<'a, I>(records: I) -> Result<Inventory>
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    let mut sums: BTreeMap<InventoryKey, i128> = BTreeMap::new();
    for record in records {
        let (Some(bullet_type), Some(quantity)) = (record.bullet_type.as_deref(), record.quantity)
        else {
            continue;
        };
        if record.usage.is_empty() || bullet_type.is_empty() {
            continue;
        }
        *sums
            .entry(InventoryKey::new(record.usage.as_str(), bullet_type))
            .or_insert(0) += i128::from(quantity);
    }

    let totals = sums
        .into_iter()
        .map(|(key, sum)| match i64::try_from(sum) {
            Ok(total) => Ok((key, total)),
            Err(_) => Err(AmmoError::Validation(format!(
                "Inventory total for {} is out of range",
                key.label()
            ))),
        })
        .collect::<Result<BTreeMap<_, _>>>()?;
    Ok(Inventory { totals })
}
