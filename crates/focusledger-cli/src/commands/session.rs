use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::Subcommand;
use focusledger_core::{Config, FocusSession};
use serde::Serialize;

use super::{open_tracker, parse_timestamp, print_json};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Record one completed focus session
    Add {
        /// Session start (local time, e.g. 2026-02-17T09:00)
        #[arg(long, value_parser = parse_timestamp)]
        start: NaiveDateTime,
        /// Session end (local time)
        #[arg(long, value_parser = parse_timestamp)]
        end: NaiveDateTime,
        /// Producer label
        #[arg(long, default_value = "manual")]
        source: String,
        /// Net focus duration in seconds, if different from end - start
        #[arg(long)]
        duration_secs: Option<i64>,
    },
    /// Replay sessions from a JSON array file; already logged sessions are skipped
    Import {
        /// Path to a JSON file containing an array of sessions
        file: PathBuf,
    },
    /// List logged sessions
    List {
        /// First day to include
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day to include
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

#[derive(Serialize)]
struct AddOutcome<'a> {
    added: bool,
    session: &'a FocusSession,
}

#[derive(Serialize)]
struct ImportOutcome {
    imported: usize,
    skipped: usize,
}

pub fn run(action: SessionAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut tracker = open_tracker(config)?;

    match action {
        SessionAction::Add {
            start,
            end,
            source,
            duration_secs,
        } => {
            let mut session = FocusSession::new(start, end, source);
            session.duration_secs = duration_secs;

            let added = tracker.record(session.clone());
            if added {
                tracker.flush()?;
            }
            print_json(&AddOutcome {
                added,
                session: &session,
            })?;
        }
        SessionAction::Import { file } => {
            let content = std::fs::read_to_string(&file)?;
            let sessions: Vec<FocusSession> = serde_json::from_str(&content)?;
            let total = sessions.len();

            let imported = tracker.record_all(sessions);
            if imported > 0 {
                tracker.flush()?;
            }
            tracing::info!(imported, total, file = %file.display(), "imported sessions");
            print_json(&ImportOutcome {
                imported,
                skipped: total - imported,
            })?;
        }
        SessionAction::List { from, to } => {
            let window_start = from
                .map(|d| d.and_time(NaiveTime::MIN))
                .unwrap_or(NaiveDateTime::MIN);
            let window_end = to
                .and_then(|d| d.succ_opt())
                .map(|d| d.and_time(NaiveTime::MIN))
                .unwrap_or(NaiveDateTime::MAX);

            let sessions = tracker.session_log().between(window_start, window_end);
            print_json(&sessions)?;
        }
    }
    Ok(())
}
