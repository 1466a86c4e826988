//! SQLite store for computed statistic values
//!
//! One row per (vehicle, statistic) tagged with a validity flag. Rows are
//! never deleted by invalidation: the last known value stays readable at the
//! storage level while a recompute is pending, but only valid rows are served.
//!
//! Schema:
//! - cache_metadata table: schema version
//! - cached_values table: (vehicle_id, stat_key) primary key + value, group rank, order, valid
//! - Index: (vehicle_id, valid) for the served query
//!
//! Every statement runs under the connection mutex, so a reader never sees a
//! half-written row. Nothing holds the lock across more than one statement.
//!
//! Cache Version History:
//! - v1: Initial version
//! - v2: Group stored as rank instead of name

use crate::error::{CoreError, Result};
use crate::models::{CachedValue, StatGroup, VehicleId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// Current cache version
///
/// Increment when the schema or the meaning of a stored value changes; a
/// mismatch clears every row on open.
const CACHE_VERSION: i32 = 2;

/// Database file name inside the cache directory
pub const CACHE_FILE: &str = "statistics.db";

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS cache_metadata (
        key TEXT PRIMARY KEY,
        value INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS cached_values (
        vehicle_id INTEGER NOT NULL,
        stat_key TEXT NOT NULL,
        value REAL NOT NULL,
        stat_group INTEGER NOT NULL,
        stat_order INTEGER NOT NULL,
        valid INTEGER NOT NULL,
        PRIMARY KEY (vehicle_id, stat_key)
    );

    CREATE INDEX IF NOT EXISTS idx_vehicle_valid ON cached_values(vehicle_id, valid);
"#;

/// SQLite-backed statistic cache (thread-safe)
pub struct CacheStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl CacheStore {
    /// Create or open the cache database under `cache_dir`
    pub fn open(cache_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(cache_dir).map_err(|source| CoreError::CacheDirectory {
            path: cache_dir.to_path_buf(),
            source,
        })?;

        let path = cache_dir.join(CACHE_FILE);
        let conn = Connection::open(&path).map_err(CoreError::storage("open"))?;

        // WAL lets the foreground read while the job writes
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(CoreError::storage("enable WAL"))?;

        let store = Self::init(conn, Some(path.clone()))?;
        debug!(path = %path.display(), "Statistic cache initialized");
        Ok(store)
    }

    /// Non-durable store, for tests and one-shot runs
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(CoreError::storage("open"))?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(CoreError::storage("create schema"))?;

        let stored_version: Option<i32> = conn
            .query_row(
                "SELECT value FROM cache_metadata WHERE key = 'version'",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(CoreError::storage("query version"))?;

        match stored_version {
            Some(v) if v == CACHE_VERSION => {
                debug!("Cache version {} matches current", CACHE_VERSION);
            }
            Some(v) => {
                warn!(
                    stored = v,
                    current = CACHE_VERSION,
                    "Cache version mismatch detected, clearing stale cache"
                );
                conn.execute("DELETE FROM cached_values", [])
                    .map_err(CoreError::storage("clear stale cache"))?;
                Self::write_version(&conn)?;
            }
            None => {
                Self::write_version(&conn)?;
                debug!("Cache version initialized to {}", CACHE_VERSION);
            }
        }

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    fn write_version(conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO cache_metadata (key, value) VALUES ('version', ?)",
            params![CACHE_VERSION],
        )
        .map_err(CoreError::storage("write version"))?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CoreError::LockPoisoned)
    }

    /// Location of the database file, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Valid rows for a vehicle, ordered by (group, order)
    ///
    /// Rows whose group rank is unknown to this build are skipped.
    pub fn valid_entries_for(&self, vehicle_id: VehicleId) -> Result<Vec<CachedValue>> {
        self.query_entries(
            "SELECT vehicle_id, stat_key, value, stat_group, stat_order, valid
             FROM cached_values
             WHERE vehicle_id = ? AND valid = 1
             ORDER BY stat_group ASC, stat_order ASC, stat_key ASC",
            vehicle_id,
        )
    }

    /// Every row for a vehicle, valid or not (storage-level view)
    pub fn all_entries_for(&self, vehicle_id: VehicleId) -> Result<Vec<CachedValue>> {
        self.query_entries(
            "SELECT vehicle_id, stat_key, value, stat_group, stat_order, valid
             FROM cached_values
             WHERE vehicle_id = ?
             ORDER BY stat_group ASC, stat_order ASC, stat_key ASC",
            vehicle_id,
        )
    }

    fn query_entries(&self, sql: &str, vehicle_id: VehicleId) -> Result<Vec<CachedValue>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(sql)
            .map_err(CoreError::storage("prepare query"))?;

        let rows = stmt
            .query_map(params![vehicle_id.get()], read_row)
            .map_err(CoreError::storage("query entries"))?;

        let mut entries = Vec::new();
        for row in rows {
            match row.map_err(CoreError::storage("read row"))? {
                Some(entry) => entries.push(entry),
                None => debug!(vehicle_id = %vehicle_id, "Skipping row with unknown group"),
            }
        }
        Ok(entries)
    }

    /// Write or replace one row and mark it valid
    ///
    /// A single statement, so the row goes from absent/invalid to
    /// valid-with-value atomically. Repeating the call is harmless.
    pub fn upsert(
        &self,
        vehicle_id: VehicleId,
        key: &str,
        value: f64,
        group: StatGroup,
        order: u32,
    ) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO cached_values (vehicle_id, stat_key, value, stat_group, stat_order, valid)
            VALUES (?1, ?2, ?3, ?4, ?5, 1)
            ON CONFLICT (vehicle_id, stat_key) DO UPDATE SET
                value = excluded.value,
                stat_group = excluded.stat_group,
                stat_order = excluded.stat_order,
                valid = 1
            "#,
            params![vehicle_id.get(), key, value, group.rank(), order],
        )
        .map_err(CoreError::storage("upsert"))?;

        debug!(vehicle_id = %vehicle_id, key, value, "Statistic cached");
        Ok(())
    }

    /// Mark every row of a vehicle invalid, keeping the values
    ///
    /// Returns the number of rows that were valid before the call.
    pub fn invalidate_all(&self, vehicle_id: VehicleId) -> Result<usize> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE cached_values SET valid = 0 WHERE vehicle_id = ? AND valid = 1",
                params![vehicle_id.get()],
            )
            .map_err(CoreError::storage("invalidate"))?;

        debug!(vehicle_id = %vehicle_id, rows = changed, "Cache invalidated");
        Ok(changed)
    }

    /// Drop every row of a vehicle (vehicle deleted upstream)
    pub fn remove_vehicle(&self, vehicle_id: VehicleId) -> Result<usize> {
        let conn = self.lock()?;
        let removed = conn
            .execute(
                "DELETE FROM cached_values WHERE vehicle_id = ?",
                params![vehicle_id.get()],
            )
            .map_err(CoreError::storage("remove vehicle"))?;

        debug!(vehicle_id = %vehicle_id, rows = removed, "Vehicle removed from cache");
        Ok(removed)
    }

    /// Get cache statistics
    pub fn stats(&self) -> Result<CacheStats> {
        let conn = self.lock()?;
        let (total, valid, vehicles): (i64, i64, i64) = conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(valid), 0), COUNT(DISTINCT vehicle_id)
                 FROM cached_values",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(CoreError::storage("count entries"))?;

        Ok(CacheStats {
            total_entries: total as usize,
            valid_entries: valid as usize,
            vehicle_count: vehicles as usize,
        })
    }

    /// Clear all cache entries
    pub fn clear(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM cached_values", [])
            .map_err(CoreError::storage("clear"))?;

        debug!("Cache cleared");
        Ok(())
    }
}

/// `None` when the stored group rank is not a known `StatGroup`
fn read_row(row: &Row<'_>) -> rusqlite::Result<Option<CachedValue>> {
    let Some(group) = StatGroup::from_rank(row.get(3)?) else {
        return Ok(None);
    };
    Ok(Some(CachedValue {
        vehicle_id: VehicleId::new(row.get(0)?),
        key: row.get(1)?,
        value: row.get(2)?,
        group,
        order: row.get(4)?,
        valid: row.get::<_, i64>(5)? != 0,
    }))
}

impl Drop for CacheStore {
    fn drop(&mut self) {
        if self.path.is_none() {
            return;
        }
        // Flush the WAL into the main file so it doesn't grow across restarts
        if let Ok(conn) = self.conn.lock() {
            if let Err(e) = conn.pragma_update(None, "wal_checkpoint", "TRUNCATE") {
                warn!("Failed to checkpoint WAL on CacheStore drop: {}", e);
            }
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub vehicle_count: usize,
}

impl CacheStats {
    pub fn invalid_entries(&self) -> usize {
        self.total_entries - self.valid_entries
    }
}
