//! CSV exchange for the transaction log.
//!
//! Reads exports of the legacy `main` sheet, in either the narrow layout
//! (no `category` column) or the rich one, and writes the rich layout back.
//! Columns are matched by header name, so column order does not matter.

use std::io::{Read, Write};

use serde::Serialize;
use uuid::Uuid;

use crate::dates::{format_timestamp, parse_date};
use crate::error::{AmmoError, Result};
use crate::resolver::CategoryResolver;
use crate::storage::{Entry, StorageEngine, TransactionRecord};

/// Header row of the rich layout.
pub const MAIN_HEADERS: [&str; 8] = [
    "date",
    "use",
    "bullet_type",
    "category",
    "quantity",
    "place",
    "gun",
    "note",
];

/// Outcome of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub ids: Vec<Uuid>,
    pub skipped: usize,
}

impl ImportReport {
    pub fn imported(&self) -> usize {
        self.ids.len()
    }
}

#[derive(Debug, Default)]
struct ColumnMap {
    date: Option<usize>,
    usage: usize,
    bullet_type: Option<usize>,
    category: Option<usize>,
    quantity: Option<usize>,
    place: Option<usize>,
    gun: Option<usize>,
    note: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|header| header.trim() == name);
        let usage = find("use")
            .ok_or_else(|| AmmoError::InvalidInput("CSV has no `use` column".to_string()))?;
        Ok(Self {
            date: find("date"),
            usage,
            bullet_type: find("bullet_type"),
            category: find("category"),
            quantity: find("quantity"),
            place: find("place"),
            gun: find("gun"),
            note: find("note"),
        })
    }
}

fn cell(row: &csv::StringRecord, index: Option<usize>) -> Option<String> {
    index
        .and_then(|index| row.get(index))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn parse_quantity(raw: &str) -> Option<i64> {
    if let Ok(value) = raw.parse::<i64>() {
        return Some(value);
    }
    // Sheet exports sometimes render whole numbers as `12.0`.
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && value.fract() == 0.0)
        // `i64::MAX as f64` rounds up to 2^63, which is already out of range.
        .filter(|value| (i64::MIN as f64..i64::MAX as f64).contains(value))
        .map(|value| value as i64)
}

/// Parse legacy rows into records, filling missing categories.
///
/// Blank lines are dropped silently. A row whose quantity is not a whole
/// number is skipped with a warning; an unreadable date is kept as undated.
/// Returns the records and the number of skipped rows.
pub fn read_legacy_csv<R: Read>(
    reader: R,
    resolver: &CategoryResolver,
) -> Result<(Vec<TransactionRecord>, usize)> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let columns = ColumnMap::from_headers(csv_reader.headers()?)?;

    let mut records = Vec::new();
    let mut skipped = 0;

    for (index, row) in csv_reader.records().enumerate() {
        let row = row?;
        let line = index + 2;
        if row.iter().all(|value| value.trim().is_empty()) {
            continue;
        }

        let quantity = match cell(&row, columns.quantity) {
            None => None,
            Some(raw) => match parse_quantity(&raw) {
                Some(value) => Some(value),
                None => {
                    tracing::warn!(line, quantity = %raw, "skipping row with invalid quantity");
                    skipped += 1;
                    continue;
                }
            },
        };

        let date = cell(&row, columns.date).and_then(|raw| {
            let parsed = parse_date(&raw);
            if parsed.is_none() {
                tracing::warn!(line, date = %raw, "unreadable date, importing as undated");
            }
            parsed
        });

        let bullet_type = cell(&row, columns.bullet_type);
        let category = match cell(&row, columns.category) {
            Some(category) => Some(category),
            None => Some(resolver.enrich(bullet_type.as_deref(), None))
                .filter(|category| !category.is_empty()),
        };

        records.push(TransactionRecord {
            date,
            usage: cell(&row, Some(columns.usage)).unwrap_or_default(),
            bullet_type,
            category,
            quantity,
            place: cell(&row, columns.place),
            gun: cell(&row, columns.gun),
            note: cell(&row, columns.note),
        });
    }

    Ok((records, skipped))
}

/// Import a legacy export, appending every readable row as one batch.
pub fn import_csv<S: StorageEngine, R: Read>(storage: &mut S, reader: R) -> Result<ImportReport> {
    let resolver = CategoryResolver::load(storage)?;
    let (records, skipped) = read_legacy_csv(reader, &resolver)?;
    let ids = storage.append_transactions(&records)?;
    tracing::info!(imported = ids.len(), skipped, "import finished");
    Ok(ImportReport { ids, skipped })
}

/// Write entries in the rich layout. Timestamps keep their time of day.
pub fn write_csv<W: Write>(writer: W, entries: &[Entry]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(MAIN_HEADERS)?;

    for entry in entries {
        let record = &entry.record;
        let quantity = record.quantity.map(|q| q.to_string()).unwrap_or_default();
        csv_writer.write_record([
            record.date.as_ref().map(format_timestamp).unwrap_or_default().as_str(),
            record.usage.as_str(),
            record.bullet_type.as_deref().unwrap_or_default(),
            record.category.as_deref().unwrap_or_default(),
            quantity.as_str(),
            record.place.as_deref().unwrap_or_default(),
            record.gun.as_deref().unwrap_or_default(),
            record.note.as_deref().unwrap_or_default(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DimensionRecord, SqliteStorage, TransactionFilter};
    use std::collections::BTreeMap;

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

    #[test]
    fn test_narrow_layout_fills_category() {
        let data = "\
date,use,bullet_type,quantity,place,gun,note
2024/01/05,training,9mm,50,range-A,G1,
2024-01-06,training,9mm,-12,range-A,G1,practice
";
        let (records, skipped) = read_legacy_csv(data.as_bytes(), &resolver()).unwrap();
        assert_eq!(skipped, 0);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].category.as_deref(), Some("handgun"));
        assert_eq!(records[0].quantity, Some(50));
        assert_eq!(records[0].note, None);
        assert_eq!(records[1].quantity, Some(-12));
        assert_eq!(records[1].note.as_deref(), Some("practice"));
    }

    #[test]
    fn test_rich_layout_keeps_category_and_any_order() {
        let data = "\
quantity,category,use,bullet_type,date
5,slug,hunting,12ga,2024-02-01
3,,training,9mm,
";
        let (records, _) = read_legacy_csv(data.as_bytes(), &resolver()).unwrap();
        assert_eq!(records[0].category.as_deref(), Some("slug"));
        assert_eq!(records[0].usage, "hunting");
        assert_eq!(records[1].category.as_deref(), Some("handgun"));
        assert_eq!(records[1].date, None);
    }

    #[test]
    fn test_bad_rows() {
        let data = "\
use,bullet_type,quantity,date
training,9mm,lots,2024-01-01
,,,
training,9mm,12.0,not a date
";
        let (records, skipped) = read_legacy_csv(data.as_bytes(), &resolver()).unwrap();
        assert_eq!(skipped, 1);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].quantity, Some(12));
        assert_eq!(records[0].date, None);
    }

    #[test]
    fn test_parse_quantity_range() {
        assert_eq!(parse_quantity("12"), Some(12));
        assert_eq!(parse_quantity("12.0"), Some(12));
        assert_eq!(parse_quantity("-3.0"), Some(-3));
        assert_eq!(parse_quantity("12.5"), None);
        assert_eq!(parse_quantity("9223372036854775807"), Some(i64::MAX));
        assert_eq!(parse_quantity("9223372036854775808.0"), None);
        assert_eq!(parse_quantity("9.3e18"), None);
        assert_eq!(parse_quantity("-9223372036854775808.0"), Some(i64::MIN));
        assert_eq!(parse_quantity("NaN"), None);
    }

    #[test]
    fn test_missing_use_column() {
        let data = "date,quantity\n2024-01-01,3\n";
        assert!(matches!(
            read_legacy_csv(data.as_bytes(), &resolver()),
            Err(AmmoError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_export_then_import() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        let data = "\
date,use,bullet_type,category,quantity,place,gun,note
2024-01-05 10:30,training,9mm,handgun,50,range-A,G1,
2024-01-06,duty,9mm,handgun,20,-,G1,transfer (in)
";
        let report = import_csv(&mut storage, data.as_bytes()).unwrap();
        assert_eq!(report.imported(), 2);

        let entries = storage.list_transactions(&TransactionFilter::new()).unwrap();
        let mut out = Vec::new();
        write_csv(&mut out, &entries).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("date,use,bullet_type,category,quantity,place,gun,note\n"));
        assert!(text.contains("2024-01-05T10:30:00,training,9mm,handgun,50,range-A,G1,"));

        let mut copy = SqliteStorage::open_in_memory().unwrap();
        import_csv(&mut copy, text.as_bytes()).unwrap();
        let copied: Vec<TransactionRecord> = copy
            .list_transactions(&TransactionFilter::new())
            .unwrap()
            .into_iter()
            .map(|entry| entry.record)
            .collect();
        let original: Vec<TransactionRecord> =
            entries.into_iter().map(|entry| entry.record).collect();
        assert_eq!(copied, original);
    }
}
