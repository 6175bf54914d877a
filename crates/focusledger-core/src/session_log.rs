//! Append-only log of completed focus sessions.
//!
//! The log is the only place where raw intervals are kept. It rejects
//! inverted or empty intervals and absorbs repeated submissions of the same
//! `(start, end)` pair, so a replayed session never gets counted twice
//! downstream.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::allocator::Interval;

/// One contiguous interval of recorded focus time.
///
/// Timestamps are naive local wall-clock times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusSession {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Producer label, e.g. "pomodoro" or "manual".
    #[serde(default)]
    pub source: String,
    /// Explicit duration recorded by the producer, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<i64>,
}

impl FocusSession {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, source: impl Into<String>) -> Self {
        Self {
            start,
            end,
            source: source.into(),
            duration_secs: None,
        }
    }

    /// Attach an explicit stored duration.
    pub fn with_duration_secs(mut self, secs: i64) -> Self {
        self.duration_secs = Some(secs);
        self
    }

    /// `true` when `end > start`.
    pub fn is_valid(&self) -> bool {
        self.end > self.start
    }

    /// Dedup identity.
    pub fn identity(&self) -> (NaiveDateTime, NaiveDateTime) {
        (self.start, self.end)
    }

    pub fn interval(&self) -> Interval {
        (self.start, self.end)
    }

    /// Duration in whole minutes.
    ///
    /// Prefers the stored `duration_secs`, falling back to `end - start`.
    /// Rounded to the nearest minute and never negative.
    pub fn duration_minutes(&self) -> u64 {
        let secs = match self.duration_secs {
            Some(secs) => secs as f64,
            None => (self.end - self.start).num_milliseconds() as f64 / 1000.0,
        };
        (secs / 60.0).round().max(0.0) as u64
    }

    /// `true` if the session overlaps the half-open window `[from, to)`.
    pub fn overlaps(&self, from: NaiveDateTime, to: NaiveDateTime) -> bool {
        self.start < to && self.end > from
    }
}

/// Deduplicated, append-only session store.
#[derive(Debug, Clone, Default)]
pub struct SessionLog {
    sessions: Vec<FocusSession>,
    seen: HashSet<(NaiveDateTime, NaiveDateTime)>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from persisted sessions, applying the same validity and
    /// dedup rules as [`SessionLog::add`].
    pub fn from_sessions(sessions: impl IntoIterator<Item = FocusSession>) -> Self {
        let mut log = Self::new();
        for session in sessions {
            log.add(session);
        }
        log
    }

    /// Append a session.
    ///
    /// Returns `false` without changing the log if the interval is empty or
    /// inverted, or if a session with the same start and end is already
    /// logged.
    pub fn add(&mut self, session: FocusSession) -> bool {
        if !session.is_valid() {
            tracing::debug!(start = %session.start, end = %session.end, "dropping invalid session");
            return false;
        }
        if !self.seen.insert(session.identity()) {
            tracing::debug!(start = %session.start, end = %session.end, "dropping duplicate session");
            return false;
        }
        self.sessions.push(session);
        true
    }

    /// All logged sessions in insertion order.
    pub fn all(&self) -> &[FocusSession] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn contains(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.seen.contains(&(start, end))
    }

    /// Sessions overlapping `[from, to)`.
    pub fn between(&self, from: NaiveDateTime, to: NaiveDateTime) -> Vec<&FocusSession> {
        self.sessions
            .iter()
            .filter(|s| s.overlaps(from, to))
            .collect()
    }

    /// Total minutes per source label.
    pub fn minutes_by_source(&self) -> BTreeMap<String, u64> {
        let mut totals = BTreeMap::new();
        for session in &self.sessions {
            *totals.entry(session.source.clone()).or_insert(0) += session.duration_minutes();
        }
        totals
    }
}
