// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SQLite storage backend

use crate::store::{ReadingStore, StoredReading};
use anyhow::{bail, Context, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, ToSql};
use std::path::PathBuf;

use sensgate::reading::{Reading, Timestamp};

/// Default database file
pub const DEFAULT_DATABASE: &str = "Sensor.db";

/// Default reading table
pub const DEFAULT_TABLE: &str = "SensorData";

/// Where and how to open a [`SqliteStore`].
#[derive(Debug, Clone)]
pub struct SqliteOptions {
    /// Database file; `None` for a private in-memory database
    pub path: Option<PathBuf>,
    /// Reading table name
    pub table: String,
    /// Delete existing rows when opening
    pub clear_up: bool,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            path: Some(PathBuf::from(DEFAULT_DATABASE)),
            table: DEFAULT_TABLE.to_string(),
            clear_up: true,
        }
    }
}

impl SqliteOptions {
    /// File database at `path` with the default table.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    /// In-memory database (for testing).
    pub fn in_memory() -> Self {
        Self {
            path: None,
            ..Default::default()
        }
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn clear_up(mut self, clear_up: bool) -> Self {
        self.clear_up = clear_up;
        self
    }
}

/// SQLite reading store
///
/// Thread-safe via internal Mutex (SQLite Connection is not Sync).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE SensorData (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     sensor_id INT,
///     sensor_value DECIMAL(4,2),
///     timestamp TIMESTAMP
/// );
/// ```
pub struct SqliteStore {
    conn: Mutex<Connection>,
    table: String,
    table_created: bool,
}

impl SqliteStore {
    /// Open (creating if needed) the database and reading table.
    pub fn open(options: &SqliteOptions) -> Result<Self> {
        if !is_valid_table_name(&options.table) {
            bail!("Invalid table name {:?}", options.table);
        }

        let conn = match &options.path {
            Some(path) => Connection::open(path).with_context(|| {
                format!("Failed to open SQLite database at {}", path.display())
            })?,
            None => Connection::open_in_memory()
                .context("Failed to create in-memory SQLite database")?,
        };

        let mut store = Self {
            conn: Mutex::new(conn),
            table: options.table.clone(),
            table_created: false,
        };
        store.table_created = store.init_schema()?;
        if options.clear_up && !store.table_created {
            store.clear().context("Failed to clean up reading table")?;
        }
        Ok(store)
    }

    /// Create an in-memory store with the default table (for testing)
    pub fn new_in_memory() -> Result<Self> {
        Self::open(&SqliteOptions::in_memory())
    }

    /// Reading table name
    pub fn table(&self) -> &str {
        &self.table
    }

    /// True if opening this store created the reading table.
    pub fn table_created(&self) -> bool {
        self.table_created
    }

    /// Create the table if missing; returns true if it was created.
    fn init_schema(&self) -> Result<bool> {
        let conn = self.conn.lock();

        let existing: Option<String> = conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [&self.table],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Ok(false);
        }

        conn.execute(
            &format!(
                "CREATE TABLE {} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    sensor_id INT,
                    sensor_value DECIMAL(4,2),
                    timestamp TIMESTAMP
                )",
                self.table
            ),
            [],
        )
        .with_context(|| format!("Failed to create table {}", self.table))?;

        Ok(true)
    }

    /// Helper function to map a row to a StoredReading
    fn row_to_reading(row: &rusqlite::Row) -> rusqlite::Result<StoredReading> {
        Ok(StoredReading {
            id: row.get(0)?,
            sensor_id: row.get(1)?,
            value: row.get(2)?,
            timestamp: row.get(3)?,
        })
    }

    fn select(&self, filter: &str, param: Option<&dyn ToSql>) -> Result<Vec<StoredReading>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT id, sensor_id, sensor_value, timestamp FROM {} {} ORDER BY id ASC",
            self.table, filter
        );
        let mut stmt = conn.prepare(&sql)?;

        let rows = match param {
            Some(p) => stmt
                .query_map([p], Self::row_to_reading)?
                .collect::<Result<Vec<_>, _>>()?,
            None => stmt
                .query_map([], Self::row_to_reading)?
                .collect::<Result<Vec<_>, _>>()?,
        };

        Ok(rows)
    }
}

impl ReadingStore for SqliteStore {
    fn insert(&self, reading: &Reading) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            &format!(
                "INSERT INTO {} (sensor_id, sensor_value, timestamp) VALUES (?1, ?2, ?3)",
                self.table
            ),
            params![reading.sensor_id, reading.value, reading.timestamp],
        )?;

        Ok(())
    }

    fn find_all(&self) -> Result<Vec<StoredReading>> {
        self.select("", None)
    }

    fn find_by_value(&self, value: f64) -> Result<Vec<StoredReading>> {
        self.select("WHERE sensor_value = ?1", Some(&value))
    }

    fn find_exceeding_value(&self, value: f64) -> Result<Vec<StoredReading>> {
        self.select("WHERE sensor_value > ?1", Some(&value))
    }

    fn find_by_timestamp(&self, ts: Timestamp) -> Result<Vec<StoredReading>> {
        self.select("WHERE timestamp = ?1", Some(&ts))
    }

    fn find_after_timestamp(&self, ts: Timestamp) -> Result<Vec<StoredReading>> {
        self.select("WHERE timestamp > ?1", Some(&ts))
    }

    fn count(&self) -> Result<u64> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.table),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn clear(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(&format!("DELETE FROM {}", self.table), [])?;
        Ok(())
    }
}

/// Table names are spliced into SQL, so only plain identifiers are accepted.
fn is_valid_table_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Reading> {
        vec![
            Reading::new(15, 20.5, 1000),
            Reading::new(21, 25.0, 1001),
            Reading::new(15, 18.0, 1002),
            Reading::new(37, 25.0, 1002),
        ]
    }

    #[test]
    fn test_sqlite_insert_and_find_all() {
        let store = SqliteStore::new_in_memory().unwrap();
        assert!(store.table_created());
        assert_eq!(store.table(), "SensorData");

        store.insert_all(&sample()).unwrap();
        let rows = store.find_all().unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].reading(), Reading::new(15, 20.5, 1000));
        assert!(rows.windows(2).all(|w| w[0].id < w[1].id));
        assert_eq!(store.count().unwrap(), 4);
    }

    #[test]
    fn test_sqlite_filters() {
        let store = SqliteStore::new_in_memory().unwrap();
        store.insert_all(&sample()).unwrap();

        let by_value = store.find_by_value(25.0).unwrap();
        assert_eq!(
            by_value.iter().map(|r| r.sensor_id).collect::<Vec<_>>(),
            vec![21, 37]
        );

        let exceeding = store.find_exceeding_value(20.0).unwrap();
        assert_eq!(exceeding.len(), 3);

        let at = store.find_by_timestamp(1002).unwrap();
        assert_eq!(at.len(), 2);

        let after = store.find_after_timestamp(1000).unwrap();
        assert_eq!(after.len(), 3);
        assert!(store.find_after_timestamp(5000).unwrap().is_empty());
    }

    #[test]
    fn test_sqlite_clear() {
        let store = SqliteStore::new_in_memory().unwrap();
        store.insert_all(&sample()).unwrap();
        store.clear().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_sqlite_reopen_respects_clear_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Sensor.db");

        {
            let store = SqliteStore::open(&SqliteOptions::file(&path)).unwrap();
            assert!(store.table_created());
            store.insert_all(&sample()).unwrap();
        }
        {
            let store = SqliteStore::open(&SqliteOptions::file(&path).clear_up(false)).unwrap();
            assert!(!store.table_created());
            assert_eq!(store.count().unwrap(), 4);
        }
        {
            let store = SqliteStore::open(&SqliteOptions::file(&path)).unwrap();
            assert!(!store.table_created());
            assert_eq!(store.count().unwrap(), 0);
        }
    }

    #[test]
    fn test_custom_table_name() {
        let store = SqliteStore::open(&SqliteOptions::in_memory().table("Readings_2")).unwrap();
        store.insert(&Reading::new(1, 1.0, 1)).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_invalid_table_name_rejected() {
        assert!(SqliteStore::open(&SqliteOptions::in_memory().table("x; DROP TABLE y")).is_err());
        assert!(SqliteStore::open(&SqliteOptions::in_memory().table("1abc")).is_err());
        assert!(SqliteStore::open(&SqliteOptions::in_memory().table("")).is_err());
    }
}
