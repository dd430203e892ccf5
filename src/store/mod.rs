//! SQLite inventory storage.
//!
//! One flat table, `inventory`, holds files and folders. `path` carries a
//! UNIQUE constraint: inserting a known path is ignored rather than
//! duplicated, so the constraint is the final word on "already known".
//!
//! The handle is owned by one command: open, scan/export, drop.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::error::{Error, Result};
use crate::scan::entry::{EntryType, InventoryRecord, StoredRecord};

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS inventory (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            type TEXT NOT NULL CHECK (type IN ('file', 'folder')),
            format TEXT NOT NULL DEFAULT '',
            name TEXT NOT NULL,
            path TEXT NOT NULL UNIQUE,
            directory TEXT NOT NULL,
            size_bytes INTEGER,
            created_date TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_inventory_name ON inventory(name)",
        [],
    )?;

    Ok(())
}

/// Outcome of one batch write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub inserted: usize,
    /// rows rejected by the path constraint
    pub ignored: usize,
}

/// Database handle. Open once per command, reuse across all operations.
pub struct Store {
    conn: Connection,
    path: PathBuf,
}

impl Store {
    /// Open or create the inventory at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let connection_error = |source| Error::StoreConnection {
            path: path.to_path_buf(),
            source,
        };

        let conn = Connection::open(path).map_err(connection_error)?;
        // also catches files that exist but are not sqlite databases
        init_schema(&conn).map_err(connection_error)?;

        debug!(path = %path.display(), "inventory opened");
        Ok(Store { conn, path: path.to_path_buf() })
    }

    /// Open an inventory that must already exist.
    pub fn open_existing(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::StoreMissing { path: path.to_path_buf() });
        }
        Store::open(path)
    }

    pub fn open_in_memory() -> Result<Self> {
        let path = PathBuf::from(":memory:");
        let connection_error = |source| Error::StoreConnection {
            path: path.clone(),
            source,
        };
        let conn = Connection::open_in_memory().map_err(connection_error)?;
        init_schema(&conn).map_err(connection_error)?;
        Ok(Store { conn, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every path already in the inventory.
    pub fn known_paths(&self) -> Result<HashSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT path FROM inventory")
            .map_err(Error::Query)?;

        let paths = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(Error::Query)?
            .collect::<rusqlite::Result<HashSet<_>>>()
            .map_err(Error::Query)?;

        Ok(paths)
    }

    /// Point lookup on the unique path index.
    pub fn contains_path(&self, path: &str) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT 1 FROM inventory WHERE path = ?1")
            .map_err(Error::Query)?;

        let found = stmt
            .query_row(params![path], |_| Ok(()))
            .optional()
            .map_err(Error::Query)?;

        Ok(found.is_some())
    }

    /// Insert a batch in one transaction. All or nothing: any failure rolls
    /// the whole batch back and is returned as `Error::Write`.
    pub fn insert_batch(&mut self, records: &[InventoryRecord]) -> Result<WriteSummary> {
        let mut summary = WriteSummary::default();
        if records.is_empty() {
            return Ok(summary);
        }

        let tx = self.conn.transaction().map_err(Error::Write)?;

        let mut stmt = tx
            .prepare_cached(
                "INSERT OR IGNORE INTO inventory (type, format, name, path, directory, size_bytes, created_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .map_err(Error::Write)?;

        for record in records {
            let changed = stmt
                .execute(params![
                    record.entry_type.as_str(),
                    record.format,
                    record.name,
                    record.path,
                    record.directory,
                    record.size_bytes.map(|s| i64::try_from(s).unwrap_or(i64::MAX)),
                    record.created_at.as_deref(),
                ])
                .map_err(Error::Write)?;

            if changed == 0 {
                summary.ignored += 1;
            } else {
                summary.inserted += 1;
            }
        }

        drop(stmt);
        tx.commit().map_err(Error::Write)?;

        debug!(inserted = summary.inserted, ignored = summary.ignored, "batch committed");
        Ok(summary)
    }

    /// All rows in insertion order.
    pub fn records(&self) -> Result<Vec<StoredRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, type, format, name, path, directory, size_bytes, created_date
                 FROM inventory
                 ORDER BY id",
            )
            .map_err(Error::Query)?;

        let records = stmt
            .query_map([], record_from_row)
            .map_err(Error::Query)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Error::Query)?;

        Ok(records)
    }

    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM inventory", [], |row| row.get(0))
            .map_err(Error::Query)?;
        Ok(count.max(0) as u64)
    }

    /// Names that occur more than once, with their counts, most frequent first.
    pub fn duplicate_names(&self) -> Result<Vec<(String, u64)>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT name, COUNT(*) AS n
                 FROM inventory
                 WHERE type = 'file'
                 GROUP BY name
                 HAVING n > 1
                 ORDER BY n DESC, name",
            )
            .map_err(Error::Query)?;

        let names = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?.max(0) as u64)))
            .map_err(Error::Query)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Error::Query)?;

        Ok(names)
    }
}

fn record_from_row(row: &rusqlite::Row) -> rusqlite::Result<StoredRecord> {
    let type_str: String = row.get(1)?;
    let entry_type = EntryType::parse(&type_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            Type::Text,
            format!("unknown entry type '{type_str}'").into(),
        )
    })?;

    Ok(StoredRecord {
        id: row.get(0)?,
        record: InventoryRecord {
            entry_type,
            format: row.get(2)?,
            name: row.get(3)?,
            path: row.get(4)?,
            directory: row.get(5)?,
            size_bytes: row.get::<_, Option<i64>>(6)?.map(|s| s.max(0) as u64),
            created_at: row.get(7)?,
        },
    })
}
