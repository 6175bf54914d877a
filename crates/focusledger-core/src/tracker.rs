//! Single owner of the session log, the hourly history and their store.
//!
//! The tracker is created once at startup with a store handle, receives
//! completed sessions from the producer, answers the query interface, and
//! is flushed at shutdown. It is not synchronized; wrap it in a mutex if
//! more than one thread needs it.

use chrono::NaiveDate;

use crate::error::Result;
use crate::history::{DailyFocusRecord, HourlyHistory, HOURS_PER_DAY};
use crate::session_log::{FocusSession, SessionLog};
use crate::stats::{
    daily_breakdown, FocusInsights, InsightsCalculator, RangeSpec, WeeklyHeatmap,
    WeeklyHeatmapAggregator,
};
use crate::storage::FocusStore;

pub struct FocusTracker<S: FocusStore> {
    store: S,
    log: SessionLog,
    history: HourlyHistory,
    heatmap: WeeklyHeatmapAggregator,
    dirty: bool,
}

impl<S: FocusStore> FocusTracker<S> {
    /// Load the log and history from `store`.
    ///
    /// # Errors
    /// Returns an error if either load fails.
    pub fn try_open(store: S) -> Result<Self> {
        let log = SessionLog::from_sessions(store.load_sessions()?);
        let history = reconcile(&log, HourlyHistory::load(&store)?);
        tracing::info!(
            sessions = log.len(),
            days = history.len(),
            "opened focus tracker"
        );
        Ok(Self::from_parts(store, log, history))
    }

    /// Load the log and history from `store`, starting empty if loading fails.
    pub fn open(store: S) -> Self {
        let loaded = store
            .load_sessions()
            .and_then(|sessions| Ok((sessions, store.load_records()?)));

        match loaded {
            Ok((sessions, records)) => {
                let log = SessionLog::from_sessions(sessions);
                let history = reconcile(&log, HourlyHistory::from_records(records));
                tracing::info!(
                    sessions = log.len(),
                    days = history.len(),
                    "opened focus tracker"
                );
                Self::from_parts(store, log, history)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load focus data, starting empty");
                Self::from_parts(store, SessionLog::new(), HourlyHistory::new())
            }
        }
    }

    fn from_parts(store: S, log: SessionLog, history: HourlyHistory) -> Self {
        Self {
            store,
            log,
            history,
            heatmap: WeeklyHeatmapAggregator::new(),
            dirty: false,
        }
    }

    /// Log a completed session and, if it is new, add it to the history.
    ///
    /// Returns `false` for invalid or already logged sessions.
    pub fn record(&mut self, session: FocusSession) -> bool {
        if !self.log.add(session) {
            return false;
        }
        if let Some(logged) = self.log.all().last() {
            self.history.ingest_session(logged);
        }
        self.dirty = true;
        true
    }

    /// Record every session; returns how many were new.
    pub fn record_all(&mut self, sessions: impl IntoIterator<Item = FocusSession>) -> usize {
        sessions
            .into_iter()
            .map(|s| self.record(s))
            .filter(|&added| added)
            .count()
    }

    /// Persist the log and the history.
    ///
    /// # Errors
    /// Returns the store's error; the in-memory state is kept either way.
    pub fn flush(&mut self) -> Result<()> {
        self.store
            .save_snapshot(self.log.all(), &self.history.to_records())?;
        self.dirty = false;
        tracing::info!(sessions = self.log.len(), "flushed focus data");
        Ok(())
    }

    /// Flush and hand back the store.
    pub fn close(mut self) -> Result<S> {
        self.flush()?;
        Ok(self.store)
    }

    /// Whether there are recorded sessions not yet flushed.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn session_log(&self) -> &SessionLog {
        &self.log
    }

    pub fn history(&self) -> &HourlyHistory {
        &self.history
    }

    pub fn sessions(&self) -> &[FocusSession] {
        self.log.all()
    }

    pub fn get_day(&self, date: NaiveDate) -> DailyFocusRecord {
        self.history.get_day(date)
    }

    /// Zero-filled records for every day in `[from, to]`.
    pub fn get_range(&self, from: NaiveDate, to: NaiveDate) -> Vec<DailyFocusRecord> {
        self.history.get_range(from, to)
    }

    /// Stored records within `range` of `today`.
    pub fn records_in_range(&self, range: RangeSpec, today: NaiveDate) -> Vec<DailyFocusRecord> {
        self.history
            .records_since(range.cutoff(today))
            .cloned()
            .collect()
    }

    pub fn aggregate_week(&self, week_start: NaiveDate) -> WeeklyHeatmap {
        self.heatmap.aggregate_week(self.log.all(), week_start)
    }

    pub fn heatmap_aggregator(&self) -> &WeeklyHeatmapAggregator {
        &self.heatmap
    }

    /// Insights for `range` ending on the local date.
    pub fn calculate_for_range(&self, range: RangeSpec) -> FocusInsights {
        InsightsCalculator::local().calculate_for_range(&self.history, range)
    }

    /// Insights for `range` ending on `today`.
    pub fn calculate_for_range_at(&self, range: RangeSpec, today: NaiveDate) -> FocusInsights {
        InsightsCalculator::new(today).calculate_for_range(&self.history, range)
    }

    pub fn daily_breakdown(&self, date: NaiveDate) -> [u32; HOURS_PER_DAY] {
        daily_breakdown(self.log.all(), date)
    }
}

/// The stored log is the source of truth; records that disagree with it
/// (a save interrupted between tables) are rebuilt from the log.
fn reconcile(log: &SessionLog, loaded: HourlyHistory) -> HourlyHistory {
    let rebuilt = HourlyHistory::from_sessions(log.all());
    if rebuilt == loaded {
        return loaded;
    }
    tracing::warn!(
        stored_minutes = loaded.total_minutes(),
        logged_minutes = rebuilt.total_minutes(),
        "stored focus records disagree with the session log, rebuilding"
    );
    rebuilt
}
