//! Persistence for sessions and daily records.
//!
//! The engine talks to storage only through [`FocusStore`]. A store hands
//! back the last saved state (or nothing) and persists whole snapshots;
//! format and location are the store's business.

mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, InsightsConfig, LoggingConfig, StorageConfig};
pub use database::SqliteStore;

use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{CoreError, Result};
use crate::history::DailyFocusRecord;
use crate::session_log::FocusSession;

/// Load/save contract for the engine's state.
pub trait FocusStore {
    /// Last saved sessions, or an empty list.
    fn load_sessions(&self) -> Result<Vec<FocusSession>>;

    /// Replace the stored sessions with `sessions`.
    fn save_sessions(&self, sessions: &[FocusSession]) -> Result<()>;

    /// Last saved daily records, or an empty list.
    fn load_records(&self) -> Result<Vec<DailyFocusRecord>>;

    /// Replace the stored daily records with `records`.
    fn save_records(&self, records: &[DailyFocusRecord]) -> Result<()>;

    /// Replace both sessions and records.
    ///
    /// Stores that can commit both at once should override this; the default
    /// saves sessions first, so a failure in between leaves records behind
    /// the log rather than ahead of it.
    fn save_snapshot(&self, sessions: &[FocusSession], records: &[DailyFocusRecord]) -> Result<()> {
        self.save_sessions(sessions)?;
        self.save_records(records)
    }
}

/// In-process store, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: Mutex<Vec<FocusSession>>,
    records: Mutex<Vec<DailyFocusRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> CoreError {
    CoreError::Custom("memory store lock poisoned".into())
}

impl FocusStore for MemoryStore {
    fn load_sessions(&self) -> Result<Vec<FocusSession>> {
        Ok(self.sessions.lock().map_err(poisoned)?.clone())
    }

    fn save_sessions(&self, sessions: &[FocusSession]) -> Result<()> {
        *self.sessions.lock().map_err(poisoned)? = sessions.to_vec();
        Ok(())
    }

    fn load_records(&self) -> Result<Vec<DailyFocusRecord>> {
        Ok(self.records.lock().map_err(poisoned)?.clone())
    }

    fn save_records(&self, records: &[DailyFocusRecord]) -> Result<()> {
        *self.records.lock().map_err(poisoned)? = records.to_vec();
        Ok(())
    }

    fn save_snapshot(&self, sessions: &[FocusSession], records: &[DailyFocusRecord]) -> Result<()> {
        let mut stored_sessions = self.sessions.lock().map_err(poisoned)?;
        let mut stored_records = self.records.lock().map_err(poisoned)?;
        *stored_sessions = sessions.to_vec();
        *stored_records = records.to_vec();
        Ok(())
    }
}

/// Returns the data directory.
///
/// `FOCUSLEDGER_DATA_DIR` wins when set. Otherwise `~/.config/focusledger/`,
/// or `~/.config/focusledger-dev/` when `FOCUSLEDGER_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("FOCUSLEDGER_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("FOCUSLEDGER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusledger-dev")
            } else {
                base_dir.join("focusledger")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    #[test]
    fn memory_store_starts_empty() {
        let store = MemoryStore::new();
        assert!(store.load_sessions().unwrap().is_empty());
        assert!(store.load_records().unwrap().is_empty());
    }

    #[test]
    fn memory_store_replaces_snapshots() {
        let store = MemoryStore::new();
        let start = NaiveDateTime::parse_from_str("2026-02-17 09:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let end = NaiveDateTime::parse_from_str("2026-02-17 09:25:00", "%Y-%m-%d %H:%M:%S").unwrap();

        store.save_sessions(&[FocusSession::new(start, end, "pomodoro")]).unwrap();
        store.save_sessions(&[]).unwrap();
        assert!(store.load_sessions().unwrap().is_empty());

        let date = NaiveDate::from_ymd_opt(2026, 2, 17).unwrap();
        store.save_records(&[DailyFocusRecord::empty(date)]).unwrap();
        assert_eq!(store.load_records().unwrap().len(), 1);
    }

    #[test]
    fn memory_store_snapshot_replaces_both() {
        let store = MemoryStore::new();
        let start = NaiveDateTime::parse_from_str("2026-02-17 09:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let end = NaiveDateTime::parse_from_str("2026-02-17 09:25:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let mut record = DailyFocusRecord::empty(start.date());
        record.add_minutes(9, 25);

        store
            .save_snapshot(&[FocusSession::new(start, end, "pomodoro")], &[record.clone()])
            .unwrap();
        assert_eq!(store.load_sessions().unwrap().len(), 1);
        assert_eq!(store.load_records().unwrap(), vec![record]);
    }
}
