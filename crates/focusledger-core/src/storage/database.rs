//! SQLite-backed focus store.
//!
//! Provides persistent storage for:
//! - Logged focus sessions
//! - Daily focus records (24 hourly counters per date)
//!
//! Every save replaces the table contents inside one transaction, and
//! `save_snapshot` writes both tables in the same one, so a failed save
//! leaves the previous snapshot intact.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};

use super::{data_dir, migrations, FocusStore};
use crate::error::{Result, StorageError};
use crate::history::{DailyFocusRecord, HOURS_PER_DAY};
use crate::session_log::FocusSession;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Default database file name inside the data directory.
pub const DEFAULT_DATABASE_FILE: &str = "focusledger.db";

/// SQLite database for sessions and daily records.
pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Path of the database file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Open (or create) the database at `path` and apply migrations.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).map_err(|source| StorageError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        let store = Self {
            conn,
            path: Some(path),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Open the database at `<data_dir>/focusledger.db`.
    ///
    /// # Errors
    /// Returns an error if the data directory or database cannot be opened.
    pub fn open_default() -> Result<Self> {
        Self::open(data_dir()?.join(DEFAULT_DATABASE_FILE))
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| StorageError::OpenFailed {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        let store = Self { conn, path: None };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        migrations::migrate(&self.conn)
            .map_err(|e| StorageError::MigrationFailed(e.to_string()))?;
        Ok(())
    }
}

fn corrupt(table: &str, message: impl Into<String>) -> StorageError {
    StorageError::Corrupt {
        table: table.to_string(),
        message: message.into(),
    }
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, StorageError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map_err(|e| corrupt("sessions", format!("bad timestamp '{value}': {e}")))
}

impl FocusStore for SqliteStore {
    fn load_sessions(&self) -> Result<Vec<FocusSession>> {
        let mut stmt = self.conn.prepare(
            "SELECT start_at, end_at, source, duration_secs
             FROM sessions
             ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<i64>>(3)?,
            ))
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            let (start, end, source, duration_secs) = row?;
            sessions.push(FocusSession {
                start: parse_timestamp(&start)?,
                end: parse_timestamp(&end)?,
                source,
                duration_secs,
            });
        }
        Ok(sessions)
    }

    fn save_sessions(&self, sessions: &[FocusSession]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        write_sessions(&tx, sessions)?;
        tx.commit()?;
        Ok(())
    }

    fn load_records(&self) -> Result<Vec<DailyFocusRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, total_minutes, hourly
             FROM daily_records
             ORDER BY date",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u32>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (date, total_minutes, hourly) = row?;
            let date = NaiveDate::parse_from_str(&date, DATE_FORMAT)
                .map_err(|e| corrupt("daily_records", format!("bad date '{date}': {e}")))?;
            let hourly: Vec<u32> = serde_json::from_str(&hourly)
                .map_err(|e| corrupt("daily_records", format!("bad hourly array for {date}: {e}")))?;
            let hourly: [u32; HOURS_PER_DAY] = hourly.try_into().map_err(|v: Vec<u32>| {
                corrupt(
                    "daily_records",
                    format!("expected {HOURS_PER_DAY} hours for {date}, got {}", v.len()),
                )
            })?;
            records.push(DailyFocusRecord {
                date,
                total_minutes,
                hourly,
            });
        }
        Ok(records)
    }

    fn save_records(&self, records: &[DailyFocusRecord]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        write_records(&tx, records)?;
        tx.commit()?;
        Ok(())
    }

    fn save_snapshot(&self, sessions: &[FocusSession], records: &[DailyFocusRecord]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        write_sessions(&tx, sessions)?;
        write_records(&tx, records)?;
        tx.commit()?;
        Ok(())
    }
}

fn write_sessions(conn: &Connection, sessions: &[FocusSession]) -> Result<()> {
    conn.execute("DELETE FROM sessions", [])?;
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO sessions (start_at, end_at, source, duration_secs)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for session in sessions {
        stmt.execute(params![
            session.start.format(TIMESTAMP_FORMAT).to_string(),
            session.end.format(TIMESTAMP_FORMAT).to_string(),
            session.source,
            session.duration_secs,
        ])?;
    }
    Ok(())
}

fn write_records(conn: &Connection, records: &[DailyFocusRecord]) -> Result<()> {
    conn.execute("DELETE FROM daily_records", [])?;
    let mut stmt = conn.prepare(
        "INSERT OR REPLACE INTO daily_records (date, total_minutes, hourly)
         VALUES (?1, ?2, ?3)",
    )?;
    for record in records {
        stmt.execute(params![
            record.date.format(DATE_FORMAT).to_string(),
            record.total_minutes,
            serde_json::to_string(&record.hourly)?,
        ])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn sessions_round_trip() {
        let store = SqliteStore::open_memory().unwrap();
        let sessions = vec![
            FocusSession::new(dt("2026-02-17 09:00:00"), dt("2026-02-17 09:25:00"), "pomodoro"),
            FocusSession::new(dt("2026-02-17 10:00:00"), dt("2026-02-17 10:40:00"), "manual")
                .with_duration_secs(35 * 60),
        ];

        store.save_sessions(&sessions).unwrap();
        assert_eq!(store.load_sessions().unwrap(), sessions);
    }

    #[test]
    fn sub_second_timestamps_survive() {
        let store = SqliteStore::open_memory().unwrap();
        let start = dt("2026-02-17 09:00:00") + chrono::Duration::milliseconds(250);
        let sessions = vec![FocusSession::new(start, dt("2026-02-17 09:25:00"), "")];

        store.save_sessions(&sessions).unwrap();
        assert_eq!(store.load_sessions().unwrap()[0].start, start);
    }

    #[test]
    fn save_replaces_previous_snapshot() {
        let store = SqliteStore::open_memory().unwrap();
        let first = FocusSession::new(dt("2026-02-17 09:00:00"), dt("2026-02-17 09:25:00"), "pomodoro");
        let second = FocusSession::new(dt("2026-02-17 10:00:00"), dt("2026-02-17 10:25:00"), "pomodoro");

        store.save_sessions(&[first.clone(), second.clone()]).unwrap();
        store.save_sessions(&[second.clone()]).unwrap();
        assert_eq!(store.load_sessions().unwrap(), vec![second]);
    }

    #[test]
    fn records_round_trip() {
        let store = SqliteStore::open_memory().unwrap();
        let mut record = DailyFocusRecord::empty(NaiveDate::from_ymd_opt(2026, 2, 17).unwrap());
        record.add_minutes(9, 45);
        record.add_minutes(23, 12);

        store.save_records(&[record.clone()]).unwrap();
        assert_eq!(store.load_records().unwrap(), vec![record]);
    }

    #[test]
    fn malformed_hourly_array_is_reported_as_corrupt() {
        let store = SqliteStore::open_memory().unwrap();
        store
            .conn()
            .execute(
                "INSERT INTO daily_records (date, total_minutes, hourly) VALUES ('2026-02-17', 5, '[5]')",
                [],
            )
            .unwrap();

        let err = store.load_records().unwrap_err();
        assert!(err.to_string().contains("expected 24 hours"));
    }

    #[test]
    fn snapshot_rolls_back_when_records_fail() {
        let store = SqliteStore::open_memory().unwrap();
        let first = FocusSession::new(dt("2026-02-17 09:00:00"), dt("2026-02-17 09:25:00"), "pomodoro");
        let mut record = DailyFocusRecord::empty(first.start.date());
        record.add_minutes(9, 25);
        store.save_snapshot(&[first.clone()], &[record.clone()]).unwrap();

        store.conn().execute("DROP TABLE daily_records", []).unwrap();
        let second = FocusSession::new(dt("2026-02-17 10:00:00"), dt("2026-02-17 10:25:00"), "pomodoro");
        assert!(store.save_snapshot(&[first.clone(), second], &[record]).is_err());

        assert_eq!(store.load_sessions().unwrap(), vec![first]);
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("focus.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .save_sessions(&[FocusSession::new(
                    dt("2026-02-17 09:00:00"),
                    dt("2026-02-17 09:25:00"),
                    "pomodoro",
                )])
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.path(), Some(path.as_path()));
        assert_eq!(store.load_sessions().unwrap().len(), 1);
    }
}
