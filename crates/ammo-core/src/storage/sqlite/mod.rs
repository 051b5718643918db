//! SQLite storage backend.
//!
//! The ledger is a single SQLite file. Transactions and reference rows are
//! ordered by an autoincrement sequence column, which fixes insertion order;
//! positions are derived from that order on every read, while the `id`
//! column gives each row a stable identity.

mod row;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::dates::format_timestamp;
use crate::error::{AmmoError, Result};
use crate::storage::traits::StorageEngine;
use crate::storage::types::{
    DimensionRecord, DimensionTable, Entry, LedgerMetadata, Position, TransactionFilter,
    TransactionRecord,
};

use row::{TransactionRow, TRANSACTION_COLUMNS};

/// On-disk format version written to the `meta` table.
pub const FORMAT_VERSION: &str = "1";

const SCHEMA: &str = r#"
    CREATE TABLE meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE transactions (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        date TEXT,
        "use" TEXT NOT NULL DEFAULT '',
        bullet_type TEXT,
        category TEXT,
        quantity INTEGER,
        place TEXT,
        gun TEXT,
        note TEXT
    );

    CREATE TABLE dim_gun (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        "gun" TEXT NOT NULL DEFAULT '',
        "type" TEXT NOT NULL DEFAULT '',
        "size" TEXT NOT NULL DEFAULT ''
    );

    CREATE TABLE dim_bullet_type (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        "bullet_type" TEXT NOT NULL DEFAULT '',
        "size" TEXT NOT NULL DEFAULT '',
        "type" TEXT NOT NULL DEFAULT '',
        "category" TEXT NOT NULL DEFAULT ''
    );

    CREATE TABLE dim_place (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        "place" TEXT NOT NULL DEFAULT '',
        "type" TEXT NOT NULL DEFAULT ''
    );

    CREATE TABLE dim_use (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        "use" TEXT NOT NULL DEFAULT ''
    );
"#;

/// SQLite storage engine.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open a fresh, schema-initialized ledger that lives only in memory.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Lock the database connection, returning an error if the mutex is poisoned.
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AmmoError::Storage("SQLite connection poisoned".to_string()))
    }

    fn initialize(conn: &Connection) -> Result<()> {
        conn.execute_batch(SCHEMA)?;

        let created_at = Utc::now().to_rfc3339();
        for (key, value) in [
            ("format_version", FORMAT_VERSION),
            ("created_at", created_at.as_str()),
            ("last_modified", created_at.as_str()),
        ] {
            conn.execute("INSERT INTO meta (key, value) VALUES (?, ?)", [key, value])?;
        }
        Ok(())
    }

    fn touch(conn: &Connection) -> Result<()> {
        conn.execute(
            "UPDATE meta SET value = ? WHERE key = 'last_modified'",
            [Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn offset(position: Position) -> Result<i64> {
        i64::try_from(position.index())
            .map_err(|_| AmmoError::InvalidPosition(position.to_string()))
    }

    /// Resolve a position to the stable ID of the row currently holding it.
    fn id_at(conn: &Connection, sql_table: &str, position: Position) -> Result<String> {
        let query = format!(
            "SELECT id FROM {} ORDER BY seq LIMIT 1 OFFSET ?",
            sql_table
        );
        conn.query_row(&query, [Self::offset(position)?], |row| row.get(0))
            .optional()?
            .ok_or_else(|| AmmoError::NotFound(format!("No row at position {}", position)))
    }

    fn parse_id(raw: &str) -> Result<Uuid> {
        Uuid::parse_str(raw).map_err(|e| AmmoError::Storage(format!("Invalid UUID: {}", e)))
    }

    fn insert_record(conn: &Connection, id: &Uuid, record: &TransactionRecord) -> Result<()> {
        conn.execute(
            &format!(
                "INSERT INTO transactions ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                TRANSACTION_COLUMNS
            ),
            (
                id.to_string(),
                record.date.as_ref().map(format_timestamp),
                &record.usage,
                &record.bullet_type,
                &record.category,
                record.quantity,
                &record.place,
                &record.gun,
                &record.note,
            ),
        )?;
        Ok(())
    }

    /// Overwrite a row by ID, returning the number of rows changed.
    fn overwrite_record(conn: &Connection, id: &str, record: &TransactionRecord) -> Result<usize> {
        let changed = conn.execute(
            r#"
            UPDATE transactions
            SET date = ?, "use" = ?, bullet_type = ?, category = ?, quantity = ?,
                place = ?, gun = ?, note = ?
            WHERE id = ?
            "#,
            (
                record.date.as_ref().map(format_timestamp),
                &record.usage,
                &record.bullet_type,
                &record.category,
                record.quantity,
                &record.place,
                &record.gun,
                &record.note,
                id,
            ),
        )?;
        Ok(changed)
    }

    fn column_list(table: DimensionTable) -> String {
        table
            .columns()
            .iter()
            .map(|column| format!("\"{}\"", column))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn column_values(table: DimensionTable, fields: &BTreeMap<String, String>) -> Vec<String> {
        table
            .columns()
            .iter()
            .map(|column| fields.get(*column).cloned().unwrap_or_default())
            .collect()
    }
}

impl StorageEngine for SqliteStorage {
    fn create(path: &Path) -> Result<()> {
        if path.exists() {
            return Err(AmmoError::Storage("Ledger file already exists".to_string()));
        }

        let conn = Connection::open(path)?;
        Self::initialize(&conn)?;
        conn.close().map_err(|(_, e)| AmmoError::from(e))?;

        tracing::info!(path = %path.display(), "created ledger");
        Ok(())
    }

    fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AmmoError::LedgerNotFound);
        }

        let conn = Connection::open(path)?;
        let format_version: Option<String> = conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'format_version'",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| AmmoError::Storage(format!("Not an ammo ledger: {}", e)))?;
        match format_version.as_deref() {
            Some(FORMAT_VERSION) => {}
            Some(other) => {
                return Err(AmmoError::Storage(format!(
                    "Unsupported ledger format version: {}",
                    other
                )))
            }
            None => {
                return Err(AmmoError::Storage(
                    "Ledger metadata missing format version".to_string(),
                ))
            }
        }

        tracing::debug!(path = %path.display(), "opened ledger");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn close(self) -> Result<()> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|_| AmmoError::Storage("SQLite connection poisoned".to_string()))?;
        conn.close().map_err(|(_, e)| AmmoError::from(e))?;
        Ok(())
    }

    fn metadata(&self) -> Result<LedgerMetadata> {
        let conn = self.lock_conn()?;

        let read = |key: &str| -> Result<String> {
            let value = conn.query_row("SELECT value FROM meta WHERE key = ?", [key], |row| {
                row.get(0)
            })?;
            Ok(value)
        };
        let parse = |key: &str, value: String| -> Result<DateTime<Utc>> {
            DateTime::parse_from_rfc3339(&value)
                .map(|parsed| parsed.with_timezone(&Utc))
                .map_err(|e| AmmoError::Storage(format!("Invalid {} timestamp: {}", key, e)))
        };

        Ok(LedgerMetadata {
            format_version: read("format_version")?,
            created_at: parse("created_at", read("created_at")?)?,
            last_modified: parse("last_modified", read("last_modified")?)?,
        })
    }

    fn append_transactions(&mut self, records: &[TransactionRecord]) -> Result<Vec<Uuid>> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            let id = Uuid::new_v4();
            Self::insert_record(&tx, &id, record)?;
            ids.push(id);
        }
        Self::touch(&tx)?;
        tx.commit()?;

        tracing::debug!(count = ids.len(), "appended transactions");
        Ok(ids)
    }

    fn list_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Entry>> {
        let conn = self.lock_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions ORDER BY seq",
            TRANSACTION_COLUMNS
        ))?;
        let mut rows = stmt.query([])?;
        let bounds = filter.bounds();

        let mut entries = Vec::new();
        let mut position = 0;
        while let Some(row) = rows.next()? {
            let entry: Entry = TransactionRow::from_sql(position, row)?.try_into()?;
            position += 1;
            if bounds.contains(&entry.record) {
                entries.push(entry);
            }
        }

        Ok(entries)
    }

    fn get_transaction(&self, id: &Uuid) -> Result<Option<Entry>> {
        let conn = self.lock_conn()?;

        let seq: Option<i64> = conn
            .query_row(
                "SELECT seq FROM transactions WHERE id = ?",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(seq) = seq else {
            return Ok(None);
        };

        let position: i64 = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE seq < ?",
            [seq],
            |row| row.get(0),
        )?;
        let position = usize::try_from(position)
            .map_err(|_| AmmoError::Storage("Negative row count".to_string()))?;

        let row = conn.query_row(
            &format!("SELECT {} FROM transactions WHERE seq = ?", TRANSACTION_COLUMNS),
            [seq],
            |row| TransactionRow::from_sql(position, row),
        )?;
        Ok(Some(row.try_into()?))
    }

    fn update_transaction(&mut self, id: &Uuid, record: &TransactionRecord) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        if Self::overwrite_record(&tx, &id.to_string(), record)? == 0 {
            return Err(AmmoError::TransactionNotFound(*id));
        }
        Self::touch(&tx)?;
        tx.commit()?;

        tracing::debug!(%id, "updated transaction");
        Ok(())
    }

    fn delete_transaction(&mut self, id: &Uuid) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let changed = tx.execute("DELETE FROM transactions WHERE id = ?", [id.to_string()])?;
        if changed == 0 {
            return Err(AmmoError::TransactionNotFound(*id));
        }
        Self::touch(&tx)?;
        tx.commit()?;

        tracing::debug!(%id, "deleted transaction");
        Ok(())
    }

    fn update_transaction_at(
        &mut self,
        position: Position,
        record: &TransactionRecord,
    ) -> Result<Uuid> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let id = Self::id_at(&tx, "transactions", position)?;
        Self::overwrite_record(&tx, &id, record)?;
        Self::touch(&tx)?;
        tx.commit()?;

        tracing::debug!(%position, %id, "updated transaction at position");
        Self::parse_id(&id)
    }

    fn delete_transaction_at(&mut self, position: Position) -> Result<Uuid> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let id = Self::id_at(&tx, "transactions", position)?;
        tx.execute("DELETE FROM transactions WHERE id = ?", [&id])?;
        Self::touch(&tx)?;
        tx.commit()?;

        tracing::debug!(%position, %id, "deleted transaction at position");
        Self::parse_id(&id)
    }

    fn list_dimension(&self, table: DimensionTable) -> Result<Vec<DimensionRecord>> {
        let conn = self.lock_conn()?;

        let columns = table.columns();
        let mut stmt = conn.prepare(&format!(
            "SELECT id, {} FROM {} ORDER BY seq",
            Self::column_list(table),
            table.sql_table()
        ))?;
        let rows = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            let mut fields = BTreeMap::new();
            for (i, column) in columns.iter().enumerate() {
                fields.insert(column.to_string(), row.get::<_, String>(i + 1)?);
            }
            Ok((id, fields))
        })?;

        let mut records = Vec::new();
        for (position, row) in rows.enumerate() {
            let (id, fields) = row?;
            records.push(DimensionRecord {
                id: Self::parse_id(&id)?,
                position,
                fields,
            });
        }
        Ok(records)
    }

    fn add_dimension(
        &mut self,
        table: DimensionTable,
        fields: &BTreeMap<String, String>,
    ) -> Result<Uuid> {
        let conn = self.lock_conn()?;

        let id = Uuid::new_v4();
        let mut values = vec![id.to_string()];
        values.extend(Self::column_values(table, fields));
        let placeholders = vec!["?"; values.len()].join(", ");
        conn.execute(
            &format!(
                "INSERT INTO {} (id, {}) VALUES ({})",
                table.sql_table(),
                Self::column_list(table),
                placeholders
            ),
            rusqlite::params_from_iter(values.iter()),
        )?;
        Self::touch(&conn)?;

        tracing::debug!(table = %table, %id, "added reference row");
        Ok(id)
    }

    fn update_dimension_at(
        &mut self,
        table: DimensionTable,
        position: Position,
        fields: &BTreeMap<String, String>,
    ) -> Result<Uuid> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let id = Self::id_at(&tx, table.sql_table(), position)?;
        let assignments = table
            .columns()
            .iter()
            .map(|column| format!("\"{}\" = ?", column))
            .collect::<Vec<_>>()
            .join(", ");
        let mut values = Self::column_values(table, fields);
        values.push(id.clone());
        tx.execute(
            &format!(
                "UPDATE {} SET {} WHERE id = ?",
                table.sql_table(),
                assignments
            ),
            rusqlite::params_from_iter(values.iter()),
        )?;
        Self::touch(&tx)?;
        tx.commit()?;

        tracing::debug!(table = %table, %position, %id, "updated reference row");
        Self::parse_id(&id)
    }

    fn delete_dimension_at(&mut self, table: DimensionTable, position: Position) -> Result<Uuid> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let id = Self::id_at(&tx, table.sql_table(), position)?;
        tx.execute(
            &format!("DELETE FROM {} WHERE id = ?", table.sql_table()),
            [&id],
        )?;
        Self::touch(&tx)?;
        tx.commit()?;

        tracing::debug!(table = %table, %position, %id, "deleted reference row");
        Self::parse_id(&id)
    }

    fn check_integrity(&self) -> Result<()> {
        let conn = self.lock_conn()?;

        let integrity: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        if integrity != "ok" {
            return Err(AmmoError::Storage(format!(
                "SQLite integrity check failed: {}",
                integrity
            )));
        }

        let metadata_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM meta WHERE key IN ('format_version', 'created_at', 'last_modified')",
            [],
            |row| row.get(0),
        )?;
        if metadata_count < 3 {
            return Err(AmmoError::Storage(
                "Metadata table missing required keys".to_string(),
            ));
        }

        let duplicate_ids: i64 = conn.query_row(
            "SELECT COUNT(*) - COUNT(DISTINCT id) FROM transactions",
            [],
            |row| row.get(0),
        )?;
        if duplicate_ids > 0 {
            return Err(AmmoError::Storage(
                "Transactions have duplicate IDs".to_string(),
            ));
        }

        let mut stmt = conn.prepare("SELECT id FROM transactions")?;
        let ids = stmt.query_map([], |row| row.get::<_, String>(0))?;
        for id in ids {
            Self::parse_id(&id?)?;
        }

        Ok(())
    }
}
