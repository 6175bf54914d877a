pub mod config;
pub mod session;
pub mod stats;

use chrono::{Local, NaiveDate, NaiveDateTime};
use focusledger_core::{Config, FocusTracker, SqliteStore};

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a naive local timestamp such as `2026-02-17T09:00` or
/// `2026-02-17 09:00:30`.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, String> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| format!("invalid timestamp '{value}' (expected YYYY-MM-DDTHH:MM[:SS])"))
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Open the tracker on the configured database.
///
/// Load failures are returned instead of starting empty so a damaged
/// database is never overwritten by a CLI flush.
pub fn open_tracker(
    config: &Config,
) -> Result<FocusTracker<SqliteStore>, Box<dyn std::error::Error>> {
    let store = SqliteStore::open(config.database_path()?)?;
    Ok(FocusTracker::try_open(store)?)
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
