//! SQLite database connection and schema for the local durable store
//!
//! Manages `~/.tunedle/tunedle.db`. Every table is namespaced by profile key
//! (`guest` or `user:<id>`) so account and guest state never mix.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: i32 = 1;

/// Shared handle to the local database
#[derive(Clone)]
pub struct LocalDb {
    conn: Arc<Mutex<Connection>>,
}

impl LocalDb {
    /// Open or create the database at a specific path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Self::init(conn)
    }

    /// Throwaway in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_version VALUES (?1)",
            [SCHEMA_VERSION],
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Lock the connection. A poisoned lock is recovered: every write runs in
    /// its own statement or transaction, so the database itself stays valid.
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn schema_version(&self) -> Result<i32> {
        let conn = self.conn();
        let version = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )?;
        Ok(version)
    }
}

/// `YYYY-MM-DD` column encoding
pub fn date_to_sql(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

/// Decode a `YYYY-MM-DD` column; garbage is a storage error, not a default
pub fn date_from_sql(raw: Option<String>, column: usize) -> rusqlite::Result<Option<NaiveDate>> {
    raw.map(|s| {
        NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
    })
    .transpose()
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);

-- One streak profile per local namespace
CREATE TABLE IF NOT EXISTS streak_profile (
    profile TEXT PRIMARY KEY,
    current_streak INTEGER NOT NULL DEFAULT 0,
    best_streak INTEGER NOT NULL DEFAULT 0,
    last_played_date TEXT,
    last_checked_date TEXT,
    daily_completed INTEGER NOT NULL DEFAULT 0,
    total_completions INTEGER NOT NULL DEFAULT 0,
    updated_at INTEGER NOT NULL
);

-- Favorites keyed by name pair; canonical_id is NULL for name-only entries.
-- sync_state: synced | pending_add | pending_remove (tombstone)
CREATE TABLE IF NOT EXISTS favorites (
    profile TEXT NOT NULL,
    category TEXT NOT NULL,
    title TEXT NOT NULL,
    canonical_id TEXT,
    sync_state TEXT NOT NULL DEFAULT 'synced',
    added_at INTEGER NOT NULL,
    PRIMARY KEY (profile, category, title)
);
CREATE INDEX IF NOT EXISTS idx_favorites_profile ON favorites(profile);

-- Local view of the remote user_stats row. synced_* hold the remote values
-- last seen, so plays recorded while offline can be replayed on top
CREATE TABLE IF NOT EXISTS stats_snapshot (
    profile TEXT PRIMARY KEY,
    total_plays INTEGER NOT NULL DEFAULT 0,
    correct_answers INTEGER NOT NULL DEFAULT 0,
    best_streak INTEGER NOT NULL DEFAULT 0,
    synced_plays INTEGER NOT NULL DEFAULT 0,
    synced_correct INTEGER NOT NULL DEFAULT 0,
    synced_best INTEGER NOT NULL DEFAULT 0,
    updated_at INTEGER NOT NULL
);

-- Daily question as first shown, keyed by YYYY-MM-DD
CREATE TABLE IF NOT EXISTS daily_pin (
    date TEXT PRIMARY KEY,
    question TEXT NOT NULL,
    pinned_at INTEGER NOT NULL
);

-- Last signed-in identity (singleton)
CREATE TABLE IF NOT EXISTS saved_session (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    user_id TEXT NOT NULL,
    email TEXT NOT NULL,
    access_token TEXT,
    saved_at INTEGER NOT NULL
);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_and_init() {
        let dir = tempdir().unwrap();
        let db = LocalDb::open(&dir.path().join("nested/test.db")).unwrap();
        assert_eq!(db.schema_version().unwrap(), SCHEMA_VERSION);

        let conn = db.conn();
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap();
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        for table in [
            "streak_profile",
            "favorites",
            "stats_snapshot",
            "daily_pin",
            "saved_session",
        ] {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        {
            let db = LocalDb::open(&path).unwrap();
            db.conn()
                .execute(
                    "INSERT INTO stats_snapshot (profile, total_plays, updated_at) VALUES ('guest', 3, 0)",
                    [],
                )
                .unwrap();
        }
        let db = LocalDb::open(&path).unwrap();
        let plays: u32 = db
            .conn()
            .query_row("SELECT total_plays FROM stats_snapshot", [], |r| r.get(0))
            .unwrap();
        assert_eq!(plays, 3);
    }

    #[test]
    fn test_date_column_codec() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1);
        assert_eq!(date_to_sql(day).as_deref(), Some("2024-03-01"));
        assert_eq!(date_from_sql(Some("2024-03-01".into()), 0).unwrap(), day);
        assert!(date_from_sql(Some("yesterday".into()), 0).is_err());
        assert_eq!(date_from_sql(None, 0).unwrap(), None);
    }
}
