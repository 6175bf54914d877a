//! Statistics module for Focus Ledger
//!
//! This module provides the read side of the engine: weekly heatmaps,
//! single-day hour breakdowns, lookback ranges and range insights.

mod breakdown;
mod heatmap;
mod insights;
mod range;

pub use breakdown::daily_breakdown;

pub use heatmap::{
    week_start_for, HeatmapCell, WeeklyHeatmap, WeeklyHeatmapAggregator, CELLS_PER_WEEK,
    SLOTS_PER_DAY, SLOT_MINUTES,
};

pub use insights::{FocusInsights, FocusSlot, InsightsCalculator};

pub use range::RangeSpec;
