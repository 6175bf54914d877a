//! Per-day, per-hour focus history.
//!
//! [`HourlyHistory`] is the only writer of [`DailyFocusRecord`]s. Sessions are
//! split into hour buckets by the allocator and added to the record of the
//! calendar date each bucket falls on. Records only ever grow.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::allocator;
use crate::error::Result;
use crate::session_log::FocusSession;
use crate::storage::FocusStore;

/// Hours in a day record.
pub const HOURS_PER_DAY: usize = 24;

/// No hour can hold more than this many focus minutes.
pub const MAX_MINUTES_PER_HOUR: u32 = 60;

const HOUR_BUCKET_MINUTES: u32 = 60;

/// Focus minutes recorded on one calendar date.
///
/// `hourly.iter().sum() == total_minutes` and every `hourly[h] <= 60`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyFocusRecord {
    pub date: NaiveDate,
    pub total_minutes: u32,
    pub hourly: [u32; HOURS_PER_DAY],
}

impl DailyFocusRecord {
    /// An all-zero record for `date`.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total_minutes: 0,
            hourly: [0; HOURS_PER_DAY],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_minutes == 0
    }

    /// Add minutes to one hour, clamped so the hour stays within 60.
    ///
    /// Returns the minutes actually applied.
    pub fn add_minutes(&mut self, hour: usize, minutes: u32) -> u32 {
        let room = MAX_MINUTES_PER_HOUR.saturating_sub(self.hourly[hour]);
        let applied = minutes.min(room);
        if applied < minutes {
            tracing::debug!(
                date = %self.date,
                hour,
                requested = minutes,
                applied,
                "clamping hourly contribution"
            );
        }
        self.hourly[hour] += applied;
        self.total_minutes += applied;
        applied
    }

    /// Whether the record satisfies its sum and cap invariants.
    pub fn is_consistent(&self) -> bool {
        self.hourly.iter().all(|&m| m <= MAX_MINUTES_PER_HOUR)
            && self.hourly.iter().sum::<u32>() == self.total_minutes
    }

    /// Hour with the most minutes, earliest hour on ties.
    pub fn peak_hour(&self) -> Option<(u8, u32)> {
        let mut best: Option<(u8, u32)> = None;
        for (hour, &minutes) in self.hourly.iter().enumerate() {
            if minutes > 0 && best.map_or(true, |(_, m)| minutes > m) {
                best = Some((hour as u8, minutes));
            }
        }
        best
    }

    /// Add another record's hours into this one under the hourly clamp.
    ///
    /// Returns the minutes actually applied.
    pub fn merge(&mut self, other: &DailyFocusRecord) -> u32 {
        other
            .hourly
            .iter()
            .enumerate()
            .map(|(hour, &minutes)| self.add_minutes(hour, minutes))
            .sum()
    }

    fn repaired(mut self) -> Self {
        for minutes in &mut self.hourly {
            *minutes = (*minutes).min(MAX_MINUTES_PER_HOUR);
        }
        self.total_minutes = self.hourly.iter().sum();
        self
    }
}

/// Daily focus records keyed by date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HourlyHistory {
    records: BTreeMap<NaiveDate, DailyFocusRecord>,
}

impl HourlyHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a history from persisted records.
    ///
    /// Records breaking the sum or cap invariant are repaired by clamping each
    /// hour to 60 and recomputing the total. A repeated date is merged hour by
    /// hour under the same clamp.
    pub fn from_records(records: impl IntoIterator<Item = DailyFocusRecord>) -> Self {
        let mut history = Self::new();
        for record in records {
            let record = if record.is_consistent() {
                record
            } else {
                tracing::warn!(date = %record.date, "repairing inconsistent focus record");
                record.repaired()
            };

            match history.records.get_mut(&record.date) {
                Some(existing) => {
                    existing.merge(&record);
                }
                None => {
                    if !record.is_empty() {
                        history.records.insert(record.date, record);
                    }
                }
            }
        }
        history
    }

    /// Load all records from `store`.
    pub fn load<S: FocusStore + ?Sized>(store: &S) -> Result<Self> {
        let records = store.load_records()?;
        tracing::info!(count = records.len(), "loaded daily focus records");
        Ok(Self::from_records(records))
    }

    /// Rebuild a history from scratch by ingesting `sessions` in order.
    pub fn from_sessions(sessions: &[FocusSession]) -> Self {
        let mut history = Self::new();
        history.ingest(sessions);
        history
    }

    /// Owned copy of every stored record, in date order.
    pub fn to_records(&self) -> Vec<DailyFocusRecord> {
        self.records.values().cloned().collect()
    }

    /// Add every session's minutes to the history.
    ///
    /// The caller guarantees no session is ingested twice.
    /// Returns the minutes added.
    pub fn ingest(&mut self, sessions: &[FocusSession]) -> u64 {
        sessions.iter().map(|s| self.ingest_session(s)).sum()
    }

    /// Add one session's minutes to the history.
    ///
    /// Each session is allocated on its own so a session always contributes
    /// the same minutes regardless of how submissions are batched.
    pub fn ingest_session(&mut self, session: &FocusSession) -> u64 {
        let buckets = allocator::allocate(&[session.interval()], HOUR_BUCKET_MINUTES);

        let mut added = 0u64;
        for (key, minutes) in buckets {
            let hour = key.index as usize;
            let record = self
                .records
                .entry(key.date)
                .or_insert_with(|| DailyFocusRecord::empty(key.date));
            added += u64::from(record.add_minutes(hour, minutes));
            if record.is_empty() {
                self.records.remove(&key.date);
            }
        }
        added
    }

    /// Record for `date`, all zeros if nothing was recorded.
    pub fn get_day(&self, date: NaiveDate) -> DailyFocusRecord {
        self.records
            .get(&date)
            .cloned()
            .unwrap_or_else(|| DailyFocusRecord::empty(date))
    }

    /// One record per calendar day in `[from, to]`, zero-filled.
    pub fn get_range(&self, from: NaiveDate, to: NaiveDate) -> Vec<DailyFocusRecord> {
        let mut days = Vec::new();
        let mut date = from;
        while date <= to {
            days.push(self.get_day(date));
            match date.checked_add_days(Days::new(1)) {
                Some(next) => date = next,
                None => break,
            }
        }
        days
    }

    /// Stored records in date order.
    pub fn records(&self) -> impl Iterator<Item = &DailyFocusRecord> {
        self.records.values()
    }

    /// Stored records dated on or after `cutoff`.
    pub fn records_since(&self, cutoff: NaiveDate) -> impl Iterator<Item = &DailyFocusRecord> {
        self.records.range(cutoff..).map(|(_, record)| record)
    }

    /// Number of dates with recorded focus.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_minutes(&self) -> u64 {
        self.records.values().map(|r| u64::from(r.total_minutes)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn session(start: &str, end: &str) -> FocusSession {
        FocusSession::new(dt(start), dt(end), "pomodoro")
    }

    #[test]
    fn ingest_accumulates_into_hours() {
        let mut history = HourlyHistory::new();
        let added = history.ingest(&[
            session("2026-02-17 09:10:00", "2026-02-17 09:35:00"),
            session("2026-02-17 09:40:00", "2026-02-17 10:05:00"),
        ]);

        assert_eq!(added, 50);
        let day = history.get_day(date("2026-02-17"));
        assert_eq!(day.hourly[9], 45);
        assert_eq!(day.hourly[10], 5);
        assert_eq!(day.total_minutes, 50);
        assert!(day.is_consistent());
    }

    #[test]
    fn ingest_splits_across_midnight() {
        let mut history = HourlyHistory::new();
        history.ingest(&[session("2026-02-16 23:00:00", "2026-02-17 02:00:00")]);

        assert_eq!(history.len(), 2);
        let monday = history.get_day(date("2026-02-16"));
        let tuesday = history.get_day(date("2026-02-17"));
        assert_eq!(monday.hourly[23], 60);
        assert_eq!(monday.total_minutes, 60);
        assert_eq!(tuesday.hourly[0], 60);
        assert_eq!(tuesday.hourly[1], 60);
        assert_eq!(tuesday.total_minutes, 120);
    }

    #[test]
    fn overlapping_sessions_are_capped_per_hour() {
        let mut history = HourlyHistory::new();
        history.ingest(&[
            session("2026-02-17 10:00:00", "2026-02-17 10:50:00"),
            session("2026-02-17 10:10:00", "2026-02-17 10:40:00"),
        ]);

        let day = history.get_day(date("2026-02-17"));
        assert_eq!(day.hourly[10], 60);
        assert_eq!(day.total_minutes, 60);
    }

    #[test]
    fn invalid_session_creates_no_record() {
        let mut history = HourlyHistory::new();
        let added = history.ingest(&[session("2026-02-17 10:00:00", "2026-02-17 10:00:00")]);
        assert_eq!(added, 0);
        assert!(history.is_empty());
    }

    #[test]
    fn sub_minute_session_creates_no_record() {
        let mut history = HourlyHistory::new();
        history.ingest(&[session("2026-02-17 10:00:00", "2026-02-17 10:00:40")]);
        assert!(history.is_empty());
    }

    #[test]
    fn get_day_without_record_is_all_zero() {
        let history = HourlyHistory::new();
        let day = history.get_day(date("2026-02-17"));
        assert_eq!(day.total_minutes, 0);
        assert_eq!(day.hourly, [0; HOURS_PER_DAY]);
    }

    #[test]
    fn get_range_is_zero_filled_and_inclusive() {
        let mut history = HourlyHistory::new();
        history.ingest(&[session("2026-02-17 09:00:00", "2026-02-17 09:30:00")]);

        let days = history.get_range(date("2026-02-16"), date("2026-02-18"));
        assert_eq!(days.len(), 3);
        assert_eq!(days[0].total_minutes, 0);
        assert_eq!(days[1].total_minutes, 30);
        assert_eq!(days[2].total_minutes, 0);
        assert_eq!(days[2].date, date("2026-02-18"));
    }

    #[test]
    fn get_range_with_reversed_bounds_is_empty() {
        let history = HourlyHistory::new();
        assert!(history.get_range(date("2026-02-18"), date("2026-02-16")).is_empty());
    }

    #[test]
    fn records_since_filters_by_cutoff() {
        let mut history = HourlyHistory::new();
        history.ingest(&[
            session("2026-02-10 09:00:00", "2026-02-10 09:30:00"),
            session("2026-02-17 09:00:00", "2026-02-17 09:30:00"),
        ]);

        let recent: Vec<_> = history.records_since(date("2026-02-11")).collect();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].date, date("2026-02-17"));
    }

    #[test]
    fn from_records_repairs_broken_rows() {
        let mut broken = DailyFocusRecord::empty(date("2026-02-17"));
        broken.hourly[9] = 90;
        broken.hourly[10] = 15;
        broken.total_minutes = 7;

        let history = HourlyHistory::from_records(vec![broken]);
        let day = history.get_day(date("2026-02-17"));
        assert_eq!(day.hourly[9], 60);
        assert_eq!(day.total_minutes, 75);
        assert!(day.is_consistent());
    }

    #[test]
    fn from_records_merges_repeated_dates() {
        let mut first = DailyFocusRecord::empty(date("2026-02-17"));
        first.add_minutes(9, 40);
        let mut second = DailyFocusRecord::empty(date("2026-02-17"));
        second.add_minutes(9, 40);
        second.add_minutes(11, 10);

        let history = HourlyHistory::from_records(vec![first, second]);
        let day = history.get_day(date("2026-02-17"));
        assert_eq!(day.hourly[9], 60);
        assert_eq!(day.hourly[11], 10);
        assert_eq!(day.total_minutes, 70);
    }

    #[test]
    fn from_sessions_matches_incremental_ingest() {
        let sessions = [
            session("2026-02-16 23:30:00", "2026-02-17 00:20:00"),
            session("2026-02-17 09:00:00", "2026-02-17 09:25:00"),
        ];
        let mut incremental = HourlyHistory::new();
        for s in &sessions {
            incremental.ingest_session(s);
        }

        let rebuilt = HourlyHistory::from_sessions(&sessions);
        assert_eq!(rebuilt, incremental);
        assert_eq!(rebuilt.to_records().len(), 2);
        assert_eq!(rebuilt.total_minutes(), 75);
    }

    #[test]
    fn merge_clamps_each_hour() {
        let mut target = DailyFocusRecord::empty(date("2026-02-17"));
        target.add_minutes(9, 50);
        let mut other = DailyFocusRecord::empty(date("2026-02-17"));
        other.add_minutes(9, 20);
        other.add_minutes(10, 5);

        assert_eq!(target.merge(&other), 15);
        assert_eq!(target.hourly[9], 60);
        assert_eq!(target.total_minutes, 65);
    }

    #[test]
    fn peak_hour_prefers_earliest_on_tie() {
        let mut record = DailyFocusRecord::empty(date("2026-02-17"));
        record.add_minutes(14, 25);
        record.add_minutes(9, 25);
        record.add_minutes(11, 10);
        assert_eq!(record.peak_hour(), Some((9, 25)));
        assert_eq!(DailyFocusRecord::empty(date("2026-02-17")).peak_hour(), None);
    }
}
