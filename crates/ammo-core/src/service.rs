//! Presentation-facing operations over an injected storage engine.
//!
//! `Service` owns the store handle for its lifetime; the caller opens the
//! store, hands it over, and gets it back with [`Service::into_storage`] to
//! close it.

use std::fmt;
use std::io::Read;
use std::str::FromStr;

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::composer::{compose, Intent, RegisterRequest};
use crate::dates::{format_date, parse_date};
use crate::error::{AmmoError, Result};
use crate::import::{import_csv, ImportReport};
use crate::inventory::{aggregate, Inventory};
use crate::resolver::CategoryResolver;
use crate::storage::{
    dimension_fields, DimensionRecord, DimensionTable, Entry, Position, StorageEngine,
    TransactionFilter, TransactionRecord,
};

/// Source of "now" for records submitted without a date.
pub type Clock = Box<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Reference data plus current stock, for populating forms.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaData {
    pub guns: Vec<DimensionRecord>,
    pub bullet_types: Vec<DimensionRecord>,
    pub places: Vec<DimensionRecord>,
    pub uses: Vec<DimensionRecord>,
    pub inventory: Inventory,
}

/// A transaction prepared for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MainRow {
    #[serde(rename = "rowIndex")]
    pub position: usize,
    pub id: Uuid,
    /// `YYYY-MM-DD`, or empty when undated
    pub date: String,
    #[serde(rename = "use")]
    pub usage: String,
    pub bullet_type: String,
    pub category: String,
    pub quantity: Option<i64>,
    pub place: String,
    pub gun: String,
    pub note: String,
}

impl From<Entry> for MainRow {
    fn from(entry: Entry) -> Self {
        let record = entry.record;
        Self {
            position: entry.position,
            id: entry.id,
            date: record.date.as_ref().map(format_date).unwrap_or_default(),
            usage: record.usage,
            bullet_type: record.bullet_type.unwrap_or_default(),
            category: record.category.unwrap_or_default(),
            quantity: record.quantity,
            place: record.place.unwrap_or_default(),
            gun: record.gun.unwrap_or_default(),
            note: record.note.unwrap_or_default(),
        }
    }
}

/// Full replacement values for an existing transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUpdate {
    pub date: Option<String>,
    #[serde(rename = "use", default)]
    pub usage: String,
    pub bullet_type: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<i64>,
    pub place: Option<String>,
    pub gun: Option<String>,
    pub note: Option<String>,
}

/// Mutation kinds for reference tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterAction {
    Add,
    Update,
    Delete,
}

impl MasterAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for MasterAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MasterAction {
    type Err = AmmoError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "add" => Ok(Self::Add),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(AmmoError::InvalidInput(format!(
                "Unknown action: {} (use add, update or delete)",
                other
            ))),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn payload_object<'a>(
    payload: &'a serde_json::Value,
    what: &str,
) -> Result<&'a serde_json::Map<String, serde_json::Value>> {
    payload
        .as_object()
        .ok_or_else(|| AmmoError::InvalidInput(format!("{} must be a JSON object", what)))
}

fn payload_position(payload: &serde_json::Value) -> Result<Position> {
    let raw = payload
        .get("rowIndex")
        .ok_or_else(|| AmmoError::InvalidPosition("missing rowIndex".to_string()))?;
    Position::try_from(raw)
}

/// The ledger's presentation operations.
pub struct Service<S: StorageEngine> {
    storage: S,
    clock: Clock,
}

impl<S: StorageEngine> Service<S> {
    /// Wrap a store, stamping undated records with the current UTC time.
    pub fn new(storage: S) -> Self {
        Self::with_clock(storage, Box::new(|| Utc::now().naive_utc()))
    }

    pub fn with_clock(storage: S, clock: Clock) -> Self {
        Self { storage, clock }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Reference tables plus the current inventory.
    pub fn get_meta_data(&self) -> Result<MetaData> {
        Ok(MetaData {
            guns: self.storage.list_dimension(DimensionTable::Gun)?,
            bullet_types: self.storage.list_dimension(DimensionTable::BulletType)?,
            places: self.storage.list_dimension(DimensionTable::Place)?,
            uses: self.storage.list_dimension(DimensionTable::Use)?,
            inventory: self.inventory()?,
        })
    }

    /// Fold the whole log into current totals.
    pub fn inventory(&self) -> Result<Inventory> {
        let entries = self.storage.list_transactions(&TransactionFilter::new())?;
        aggregate(entries.iter().map(|entry| &entry.record))
    }

    /// Refuse a write that would push any stock total out of range.
    fn check_totals<F>(&self, keep: F, added: &[TransactionRecord]) -> Result<()>
    where
        F: Fn(&Entry) -> bool,
    {
        let entries = self.storage.list_transactions(&TransactionFilter::new())?;
        let kept = entries
            .iter()
            .filter(|entry| keep(entry))
            .map(|entry| &entry.record);
        aggregate(kept.chain(added)).map(|_| ())
    }

    /// Validate and record a registration payload.
    pub fn register_data(&mut self, request: RegisterRequest) -> Result<Vec<Uuid>> {
        let intent = Intent::try_from(request)?;
        self.register(&intent)
    }

    /// Record an intent; a transfer's two legs are appended atomically.
    pub fn register(&mut self, intent: &Intent) -> Result<Vec<Uuid>> {
        let resolver = CategoryResolver::load(&self.storage)?;
        let records = compose(intent, &resolver, (self.clock)())?;
        self.check_totals(|_| true, &records)?;
        let ids = self.storage.append_transactions(&records)?;
        tracing::info!(mode = intent.mode().as_str(), records = ids.len(), "registered");
        Ok(ids)
    }

    /// Positioned transactions, optionally restricted by date.
    pub fn get_main_data(&self, filter: &TransactionFilter) -> Result<Vec<MainRow>> {
        Ok(self
            .entries(filter)?
            .into_iter()
            .map(MainRow::from)
            .collect())
    }

    /// Positioned transactions as stored.
    pub fn entries(&self, filter: &TransactionFilter) -> Result<Vec<Entry>> {
        self.storage.list_transactions(filter)
    }

    pub fn delete_main_record(&mut self, position: Position) -> Result<Uuid> {
        self.storage.delete_transaction_at(position)
    }

    /// Replace the transaction at `position`, re-deriving its category.
    pub fn update_main_record(&mut self, position: Position, update: RecordUpdate) -> Result<Uuid> {
        let record = self.build_record(update)?;
        self.check_totals(
            |entry| entry.position != position.index(),
            std::slice::from_ref(&record),
        )?;
        self.storage.update_transaction_at(position, &record)
    }

    /// Replace the transaction with the given ID, re-deriving its category.
    pub fn update_record_by_id(&mut self, id: &Uuid, update: RecordUpdate) -> Result<()> {
        let record = self.build_record(update)?;
        self.check_totals(|entry| entry.id != *id, std::slice::from_ref(&record))?;
        self.storage.update_transaction(id, &record)
    }

    fn build_record(&self, update: RecordUpdate) -> Result<TransactionRecord> {
        let date = match non_empty(update.date) {
            None => (self.clock)(),
            Some(raw) => parse_date(&raw)
                .ok_or_else(|| AmmoError::Validation(format!("Unrecognized date: {}", raw)))?,
        };
        let bullet_type = non_empty(update.bullet_type);
        let resolver = CategoryResolver::load(&self.storage)?;
        let category = resolver.enrich(bullet_type.as_deref(), update.category.as_deref());

        Ok(TransactionRecord {
            date: Some(date),
            usage: update.usage,
            bullet_type,
            category: non_empty(Some(category)),
            quantity: update.quantity,
            place: non_empty(update.place),
            gun: non_empty(update.gun),
            note: non_empty(update.note),
        })
    }

    /// Rows of the named reference table.
    pub fn list_master(&self, table: &str) -> Result<Vec<DimensionRecord>> {
        self.storage.list_dimension(table.parse()?)
    }

    /// Append a legacy CSV export to the log.
    pub fn import_csv<R: Read>(&mut self, reader: R) -> Result<ImportReport> {
        import_csv(&mut self.storage, reader)
    }

    /// Add, update or delete a reference row.
    ///
    /// Payloads: `add` takes a field map; `update` takes
    /// `{"rowIndex": n, "values": {...}}`; `delete` takes `{"rowIndex": n}`.
    pub fn update_master_data(
        &mut self,
        table: &str,
        action: &str,
        payload: &serde_json::Value,
    ) -> Result<Uuid> {
        let table: DimensionTable = table.parse()?;
        let action: MasterAction = action.parse()?;

        let id = match action {
            MasterAction::Add => {
                let fields = dimension_fields(table, payload_object(payload, "payload")?);
                self.storage.add_dimension(table, &fields)?
            }
            MasterAction::Update => {
                let position = payload_position(payload)?;
                let values = payload
                    .get("values")
                    .ok_or_else(|| AmmoError::InvalidInput("missing values".to_string()))?;
                let fields = dimension_fields(table, payload_object(values, "values")?);
                self.storage.update_dimension_at(table, position, &fields)?
            }
            MasterAction::Delete => {
                let position = payload_position(payload)?;
                self.storage.delete_dimension_at(table, position)?
            }
        };

        tracing::info!(table = %table, action = %action, %id, "reference data changed");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStorage;
    use chrono::NaiveDate;
    use serde_json::json;

    fn fixed_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn service() -> Service<SqliteStorage> {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let mut service = Service::with_clock(storage, Box::new(fixed_now));
        service
            .update_master_data(
                "bullet_type",
                "add",
                &json!({"bullet_type": "9mm", "category": "handgun"}),
            )
            .unwrap();
        service
    }

    fn purchase() -> RegisterRequest {
        serde_json::from_value(json!({
            "mode": "purchase",
            "bulletType": "9mm",
            "quantity": 50,
            "use": "training",
            "place": "range-A",
            "gun": "G1"
        }))
        .unwrap()
    }

    fn transfer() -> RegisterRequest {
        serde_json::from_value(json!({
            "mode": "transfer",
            "fromUse": "training",
            "toUse": "duty",
            "bulletType": "9mm",
            "quantity": 20,
            "gun": "G1"
        }))
        .unwrap()
    }

    #[test]
    fn test_purchase_scenario() {
        let mut service = service();
        let ids = service.register_data(purchase()).unwrap();
        assert_eq!(ids.len(), 1);

        let rows = service.get_main_data(&TransactionFilter::new()).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.usage, "training");
        assert_eq!(row.bullet_type, "9mm");
        assert_eq!(row.category, "handgun");
        assert_eq!(row.quantity, Some(50));
        assert_eq!(row.place, "range-A");
        assert_eq!(row.gun, "G1");
        assert_eq!(row.date, "2024-01-15");

        let meta = service.get_meta_data().unwrap();
        assert_eq!(meta.inventory.get("training", "9mm"), 50);
        assert_eq!(meta.bullet_types.len(), 1);
    }

    #[test]
    fn test_transfer_scenario() {
        let mut service = service();
        service.register_data(purchase()).unwrap();
        let ids = service.register_data(transfer()).unwrap();
        assert_eq!(ids.len(), 2);

        let rows = service.get_main_data(&TransactionFilter::new()).unwrap();
        let quantities: Vec<Option<i64>> = rows.iter().map(|row| row.quantity).collect();
        assert_eq!(quantities, vec![Some(50), Some(-20), Some(20)]);

        let inventory = service.inventory().unwrap();
        assert_eq!(inventory.get("training", "9mm"), 30);
        assert_eq!(inventory.get("duty", "9mm"), 20);
    }

    #[test]
    fn test_meta_data_json_shape() {
        let mut service = service();
        service.register_data(purchase()).unwrap();

        let value = serde_json::to_value(service.get_meta_data().unwrap()).unwrap();
        assert_eq!(value["bulletTypes"][0]["bullet_type"], "9mm");
        assert_eq!(value["bulletTypes"][0]["rowIndex"], 0);
        assert_eq!(value["inventory"]["training|9mm"], 50);
        assert!(value["guns"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_position_leaves_ledger_unchanged() {
        let mut service = service();
        service.register_data(purchase()).unwrap();
        let before = service.entries(&TransactionFilter::new()).unwrap();

        let negative = Position::try_from(-1i64).and_then(|p| service.delete_main_record(p));
        assert!(matches!(negative, Err(AmmoError::InvalidPosition(_))));

        let fractional = Position::try_from(0.5f64)
            .and_then(|p| service.update_main_record(p, RecordUpdate::default()));
        assert!(matches!(fractional, Err(AmmoError::InvalidPosition(_))));

        assert_eq!(service.entries(&TransactionFilter::new()).unwrap(), before);
    }

    #[test]
    fn test_update_main_record_re_resolves_category() {
        let mut service = service();
        service
            .update_master_data(
                "bullet_type",
                "add",
                &json!({"bullet_type": "12ga", "category": "shotgun"}),
            )
            .unwrap();
        service.register_data(purchase()).unwrap();

        let update = RecordUpdate {
            date: Some("2024-02-01".to_string()),
            usage: "hunting".to_string(),
            bullet_type: Some("12ga".to_string()),
            category: Some("handgun".to_string()),
            quantity: Some(25),
            ..RecordUpdate::default()
        };
        service.update_main_record(Position::new(0), update).unwrap();

        let rows = service.get_main_data(&TransactionFilter::new()).unwrap();
        assert_eq!(rows[0].category, "shotgun");
        assert_eq!(rows[0].date, "2024-02-01");
        assert_eq!(rows[0].usage, "hunting");
        assert_eq!(service.inventory().unwrap().get("training", "9mm"), 0);
    }

    #[test]
    fn test_update_record_by_id_re_resolves_category() {
        let mut service = service();
        service
            .update_master_data(
                "bullet_type",
                "add",
                &json!({"bullet_type": "12ga", "category": "shotgun"}),
            )
            .unwrap();
        service.register_data(purchase()).unwrap();
        let id = service.register_data(purchase()).unwrap()[0];

        let update = RecordUpdate {
            usage: "hunting".to_string(),
            bullet_type: Some("12ga".to_string()),
            quantity: Some(10),
            place: Some(String::new()),
            ..RecordUpdate::default()
        };
        service.update_record_by_id(&id, update).unwrap();

        let rows = service.get_main_data(&TransactionFilter::new()).unwrap();
        assert_eq!(rows[1].id, id);
        assert_eq!(rows[1].category, "shotgun");
        assert_eq!(rows[1].date, "2024-01-15");
        assert_eq!(rows[1].place, "");
        assert_eq!(rows[0].category, "handgun");

        let stored = service.storage().get_transaction(&id).unwrap().unwrap();
        assert_eq!(stored.record.place, None);

        let missing = service.update_record_by_id(&Uuid::nil(), RecordUpdate::default());
        assert!(matches!(missing, Err(AmmoError::TransactionNotFound(_))));
    }

    #[test]
    fn test_out_of_range_stock_is_refused() {
        let mut service = service();
        let mut huge = purchase();
        huge.quantity = Some(i64::MAX);
        service.register_data(huge).unwrap();

        let result = service.register_data(purchase());
        assert!(matches!(result, Err(AmmoError::Validation(_))));

        let meta = service.get_meta_data().unwrap();
        assert_eq!(meta.inventory.get("training", "9mm"), i64::MAX);
        assert_eq!(service.entries(&TransactionFilter::new()).unwrap().len(), 1);

        service.register_data(transfer()).unwrap();
        assert_eq!(service.inventory().unwrap().get("training", "9mm"), i64::MAX - 20);

        // Replacing the big row itself stays allowed.
        let update = RecordUpdate {
            usage: "training".to_string(),
            bullet_type: Some("9mm".to_string()),
            quantity: Some(100),
            ..RecordUpdate::default()
        };
        service.update_main_record(Position::new(0), update).unwrap();
        assert_eq!(service.inventory().unwrap().get("training", "9mm"), 80);

        let update = RecordUpdate {
            usage: "duty".to_string(),
            bullet_type: Some("9mm".to_string()),
            quantity: Some(i64::MAX),
            ..RecordUpdate::default()
        };
        let result = service.update_main_record(Position::new(1), update);
        assert!(matches!(result, Err(AmmoError::Validation(_))));
        assert_eq!(service.inventory().unwrap().get("duty", "9mm"), 20);
    }

    #[test]
    fn test_delete_main_record() {
        let mut service = service();
        service.register_data(purchase()).unwrap();
        service.register_data(transfer()).unwrap();

        service.delete_main_record(Position::new(0)).unwrap();
        let rows = service.get_main_data(&TransactionFilter::new()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].position, 0);
        assert_eq!(rows[0].quantity, Some(-20));
    }

    #[test]
    fn test_date_filter_scenario() {
        let mut service = service();
        for date in ["2024-01-05", "2024-01-15"] {
            let mut request = purchase();
            request.date = Some(date.to_string());
            service.register_data(request).unwrap();
        }

        let filter = TransactionFilter::new()
            .start_date("2024-01-10")
            .end_date("2024-01-20");
        let rows = service.get_main_data(&filter).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, "2024-01-15");
        assert_eq!(rows[0].position, 1);
    }

    #[test]
    fn test_master_data_rejects_unknown_table() {
        let mut service = service();
        let result = service.update_master_data("main", "add", &json!({"use": "x"}));
        assert!(matches!(result, Err(AmmoError::InvalidTableName(name)) if name == "main"));

        let result = service.update_master_data("use", "rename", &json!({}));
        assert!(matches!(result, Err(AmmoError::InvalidInput(_))));
    }

    #[test]
    fn test_master_data_update_and_delete() {
        let mut service = service();
        service
            .update_master_data("use", "add", &json!({"use": "training"}))
            .unwrap();
        service
            .update_master_data("use", "add", &json!({"use": "duty"}))
            .unwrap();

        service
            .update_master_data(
                "use",
                "update",
                &json!({"rowIndex": 1, "values": {"use": "patrol"}}),
            )
            .unwrap();
        service
            .update_master_data("use", "delete", &json!({"rowIndex": 0}))
            .unwrap();

        let uses = service.list_master("use").unwrap();
        assert_eq!(uses.len(), 1);
        assert_eq!(uses[0].get("use"), "patrol");

        let bad = service.update_master_data("use", "delete", &json!({"rowIndex": -3}));
        assert!(matches!(bad, Err(AmmoError::InvalidPosition(_))));
        assert_eq!(service.get_meta_data().unwrap().uses.len(), 1);
    }
}
