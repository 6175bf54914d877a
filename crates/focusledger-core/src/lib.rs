//! # Focus Ledger Core Library
//!
//! This library turns completed focus sessions into time-bucketed
//! statistics. It follows a CLI-first approach: every operation is usable
//! from the standalone `focusledger` binary, and any GUI is a thin layer
//! over the same core.
//!
//! ## Architecture
//!
//! - **Session log**: append-only, deduplicated store of raw intervals
//! - **Allocator**: splits intervals into calendar buckets and rounds to
//!   whole minutes without losing the total
//! - **History**: per-date, per-hour records built from the log
//! - **Stats**: weekly heatmap, single-day breakdown, range insights
//! - **Storage**: SQLite persistence behind the [`FocusStore`] trait, plus
//!   TOML configuration
//!
//! ## Key Components
//!
//! - [`FocusTracker`]: owns the log, history and store
//! - [`allocate`]: largest-remainder interval bucketing
//! - [`WeeklyHeatmapAggregator`]: 7 x 12 two-hour heatmap
//! - [`InsightsCalculator`]: totals, averages, best and worst slot

pub mod allocator;
pub mod error;
pub mod history;
pub mod session_log;
pub mod stats;
pub mod storage;
pub mod tracker;

pub use allocator::{allocate, BucketKey};
pub use error::{ConfigError, CoreError, StorageError};
pub use history::{DailyFocusRecord, HourlyHistory, HOURS_PER_DAY};
pub use session_log::{FocusSession, SessionLog};
pub use stats::{
    daily_breakdown, week_start_for, FocusInsights, FocusSlot, HeatmapCell, InsightsCalculator,
    RangeSpec, WeeklyHeatmap, WeeklyHeatmapAggregator,
};
pub use storage::{Config, FocusStore, MemoryStore, SqliteStore};
pub use tracker::FocusTracker;
