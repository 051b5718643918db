//! Translation of user intents into ledger records.
//!
//! A purchase, consumption or non-consuming event becomes one record. A
//! transfer between usages becomes two records with opposite quantities, so
//! its net contribution to stock is always zero.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::dates::parse_date;
use crate::error::{AmmoError, Result};
use crate::resolver::CategoryResolver;
use crate::storage::TransactionRecord;

/// Place recorded on both legs of a transfer.
pub const TRANSFER_PLACE: &str = "-";

/// Note on the outbound leg of a transfer.
pub const TRANSFER_OUT_NOTE: &str = "transfer (out)";

/// Note on the inbound leg of a transfer.
pub const TRANSFER_IN_NOTE: &str = "transfer (in)";

/// Kind of movement being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Purchase,
    Consumption,
    Event,
    Transfer,
}

impl Mode {
    /// Interpret a mode label. Anything other than a known label is a purchase.
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(str::trim) {
            Some("transfer") => Self::Transfer,
            Some("consumption") => Self::Consumption,
            Some("event") => Self::Event,
            _ => Self::Purchase,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Consumption => "consumption",
            Self::Event => "event",
            Self::Transfer => "transfer",
        }
    }
}

/// Loose registration payload, as submitted by a form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub mode: Option<String>,
    pub date: Option<String>,
    #[serde(rename = "use")]
    pub usage: Option<String>,
    pub bullet_type: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<i64>,
    pub place: Option<String>,
    pub gun: Option<String>,
    #[serde(alias = "note")]
    pub results: Option<String>,
    pub from_use: Option<String>,
    pub to_use: Option<String>,
}

/// A single-record movement (purchase, consumption or event).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Movement {
    pub mode: Mode,
    pub date: Option<NaiveDateTime>,
    pub usage: String,
    pub bullet_type: Option<String>,
    pub category: Option<String>,
    /// Signed as supplied; absent for non-consuming events
    pub quantity: Option<i64>,
    pub place: Option<String>,
    pub gun: Option<String>,
    pub note: Option<String>,
}

/// A reallocation between two usages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub date: Option<NaiveDateTime>,
    pub from_use: String,
    pub to_use: String,
    pub bullet_type: Option<String>,
    /// Only the magnitude matters
    pub quantity: i64,
    pub gun: Option<String>,
}

/// Validated user intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Movement(Movement),
    Transfer(Transfer),
}

impl Intent {
    pub fn mode(&self) -> Mode {
        match self {
            Intent::Movement(movement) => movement.mode,
            Intent::Transfer(_) => Mode::Transfer,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn parse_input_date(value: Option<String>) -> Result<Option<NaiveDateTime>> {
    match non_empty(value) {
        None => Ok(None),
        Some(raw) => parse_date(&raw)
            .map(Some)
            .ok_or_else(|| AmmoError::Validation(format!("Unrecognized date: {}", raw))),
    }
}

impl TryFrom<RegisterRequest> for Intent {
    type Error = AmmoError;

    fn try_from(request: RegisterRequest) -> Result<Self> {
        let mode = Mode::from_label(request.mode.as_deref());
        let date = parse_input_date(request.date)?;

        if mode == Mode::Transfer {
            let quantity = request.quantity.ok_or_else(|| {
                AmmoError::Validation("Transfer requires a quantity".to_string())
            })?;
            let from_use = non_empty(request.from_use).ok_or_else(|| {
                AmmoError::Validation("Transfer requires a source use".to_string())
            })?;
            let to_use = non_empty(request.to_use).ok_or_else(|| {
                AmmoError::Validation("Transfer requires a destination use".to_string())
            })?;
            return Ok(Intent::Transfer(Transfer {
                date,
                from_use,
                to_use,
                bullet_type: non_empty(request.bullet_type),
                quantity,
                gun: non_empty(request.gun),
            }));
        }

        Ok(Intent::Movement(Movement {
            mode,
            date,
            usage: request.usage.unwrap_or_default(),
            bullet_type: non_empty(request.bullet_type),
            category: non_empty(request.category),
            quantity: request.quantity,
            place: non_empty(request.place),
            gun: non_empty(request.gun),
            note: non_empty(request.results),
        }))
    }
}

/// Compose the ledger records for `intent`.
///
/// `now` stamps records whose intent carries no date.
pub fn compose(
    intent: &Intent,
    resolver: &CategoryResolver,
    now: NaiveDateTime,
) -> Result<Vec<TransactionRecord>> {
    match intent {
        Intent::Movement(movement) => {
            let category = resolver.enrich(
                movement.bullet_type.as_deref(),
                movement.category.as_deref(),
            );
            Ok(vec![TransactionRecord {
                date: Some(movement.date.unwrap_or(now)),
                usage: movement.usage.clone(),
                bullet_type: movement.bullet_type.clone(),
                category: non_empty(Some(category)),
                quantity: movement.quantity,
                place: movement.place.clone(),
                gun: movement.gun.clone(),
                note: movement.note.clone(),
            }])
        }
        Intent::Transfer(transfer) => {
            let magnitude = transfer.quantity.checked_abs().ok_or_else(|| {
                AmmoError::Validation(format!(
                    "Transfer quantity out of range: {}",
                    transfer.quantity
                ))
            })?;
            let category = non_empty(Some(
                resolver.enrich(transfer.bullet_type.as_deref(), None),
            ));
            let leg = |usage: &str, quantity: i64, note: &str| TransactionRecord {
                date: Some(transfer.date.unwrap_or(now)),
                usage: usage.to_string(),
                bullet_type: transfer.bullet_type.clone(),
                category: category.clone(),
                quantity: Some(quantity),
                place: Some(TRANSFER_PLACE.to_string()),
                gun: transfer.gun.clone(),
                note: Some(note.to_string()),
            };
            Ok(vec![
                leg(&transfer.from_use, -magnitude, TRANSFER_OUT_NOTE),
                leg(&transfer.to_use, magnitude, TRANSFER_IN_NOTE),
            ])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DimensionRecord;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap()
    }

    fn resolver() -> CategoryResolver {
        let mut fields = BTreeMap::new();
        fields.insert("bullet_type".to_string(), "9mm".to_string());
        fields.insert("category".to_string(), "handgun".to_string());
        CategoryResolver::new(vec![DimensionRecord {
            id: Uuid::new_v4(),
            position: 0,
            fields,
        }])
    }

    fn transfer(quantity: i64) -> Intent {
        Intent::Transfer(Transfer {
            date: None,
            from_use: "training".to_string(),
            to_use: "duty".to_string(),
            bullet_type: Some("9mm".to_string()),
            quantity,
            gun: Some("G1".to_string()),
        })
    }

    #[test]
    fn test_purchase_resolves_category() {
        let request = RegisterRequest {
            mode: Some("purchase".to_string()),
            usage: Some("training".to_string()),
            bullet_type: Some("9mm".to_string()),
            quantity: Some(50),
            place: Some("range-A".to_string()),
            gun: Some("G1".to_string()),
            ..RegisterRequest::default()
        };
        let intent = Intent::try_from(request).unwrap();
        let records = compose(&intent, &resolver(), now()).unwrap();

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.usage, "training");
        assert_eq!(record.bullet_type.as_deref(), Some("9mm"));
        assert_eq!(record.category.as_deref(), Some("handgun"));
        assert_eq!(record.quantity, Some(50));
        assert_eq!(record.place.as_deref(), Some("range-A"));
        assert_eq!(record.gun.as_deref(), Some("G1"));
        assert_eq!(record.date, Some(now()));
    }

    #[test]
    fn test_event_without_type_keeps_supplied_category() {
        let request: RegisterRequest = serde_json::from_value(serde_json::json!({
            "mode": "event",
            "use": "hunting",
            "category": "rifle",
            "place": "north field",
            "results": "two deer"
        }))
        .unwrap();
        let intent = Intent::try_from(request).unwrap();
        assert_eq!(intent.mode(), Mode::Event);

        let records = compose(&intent, &resolver(), now()).unwrap();
        assert_eq!(records[0].category.as_deref(), Some("rifle"));
        assert_eq!(records[0].quantity, None);
        assert_eq!(records[0].bullet_type, None);
        assert_eq!(records[0].note.as_deref(), Some("two deer"));
    }

    #[test]
    fn test_consumption_sign_is_taken_as_given() {
        let request = RegisterRequest {
            mode: Some("consumption".to_string()),
            usage: Some("training".to_string()),
            bullet_type: Some("9mm".to_string()),
            quantity: Some(-12),
            ..RegisterRequest::default()
        };
        let records = compose(&Intent::try_from(request).unwrap(), &resolver(), now()).unwrap();
        assert_eq!(records[0].quantity, Some(-12));
    }

    #[test]
    fn test_missing_mode_is_single_record() {
        let request = RegisterRequest {
            usage: Some("training".to_string()),
            quantity: Some(3),
            ..RegisterRequest::default()
        };
        let intent = Intent::try_from(request).unwrap();
        assert_eq!(intent.mode(), Mode::Purchase);
        assert_eq!(compose(&intent, &resolver(), now()).unwrap().len(), 1);
    }

    #[test]
    fn test_supplied_date_wins() {
        let request = RegisterRequest {
            date: Some("2023-12-24".to_string()),
            usage: Some("training".to_string()),
            ..RegisterRequest::default()
        };
        let records = compose(&Intent::try_from(request).unwrap(), &resolver(), now()).unwrap();
        assert_eq!(
            records[0].date.unwrap().date(),
            NaiveDate::from_ymd_opt(2023, 12, 24).unwrap()
        );

        let bad = RegisterRequest {
            date: Some("soon".to_string()),
            ..RegisterRequest::default()
        };
        assert!(matches!(
            Intent::try_from(bad),
            Err(AmmoError::Validation(_))
        ));
    }

    #[test]
    fn test_transfer_legs() {
        let records = compose(&transfer(20), &resolver(), now()).unwrap();
        assert_eq!(records.len(), 2);

        let (out, inbound) = (&records[0], &records[1]);
        assert_eq!(out.usage, "training");
        assert_eq!(out.quantity, Some(-20));
        assert_eq!(out.note.as_deref(), Some(TRANSFER_OUT_NOTE));
        assert_eq!(inbound.usage, "duty");
        assert_eq!(inbound.quantity, Some(20));
        assert_eq!(inbound.note.as_deref(), Some(TRANSFER_IN_NOTE));

        for leg in &records {
            assert_eq!(leg.place.as_deref(), Some(TRANSFER_PLACE));
            assert_eq!(leg.category.as_deref(), Some("handgun"));
            assert_eq!(leg.gun.as_deref(), Some("G1"));
            assert_eq!(leg.date, Some(now()));
        }
    }

    #[test]
    fn test_transfer_validation() {
        let missing_quantity: RegisterRequest = serde_json::from_value(serde_json::json!({
            "mode": "transfer",
            "fromUse": "training",
            "toUse": "duty"
        }))
        .unwrap();
        assert!(matches!(
            Intent::try_from(missing_quantity),
            Err(AmmoError::Validation(_))
        ));

        let missing_target: RegisterRequest = serde_json::from_value(serde_json::json!({
            "mode": "transfer",
            "fromUse": "training",
            "quantity": 5
        }))
        .unwrap();
        assert!(Intent::try_from(missing_target).is_err());

        assert!(compose(&transfer(i64::MIN), &resolver(), now()).is_err());
    }

    proptest! {
        #[test]
        fn prop_transfer_conserves_stock(quantity in (i64::MIN + 1)..=i64::MAX) {
            let records = compose(&transfer(quantity), &resolver(), now()).unwrap();
            prop_assert_eq!(records.len(), 2);

            let out = records[0].quantity.unwrap();
            let inbound = records[1].quantity.unwrap();
            prop_assert_eq!(out + inbound, 0);
            prop_assert_eq!(out.abs(), quantity.abs());
            prop_assert_eq!(inbound.abs(), quantity.abs());
            prop_assert!(out <= 0);
        }
    }
}
