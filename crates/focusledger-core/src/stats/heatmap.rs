//! Weekly focus heatmap.
//!
//! This module buckets one week of focus sessions into 2-hour slots per
//! weekday to show when focus time clusters.

use chrono::{Datelike, Days, Duration, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::allocator::{self, clip, Interval};
use crate::session_log::FocusSession;

/// Width of one heatmap slot in minutes.
pub const SLOT_MINUTES: u32 = 120;

/// Slots per day.
pub const SLOTS_PER_DAY: usize = 12;

/// Cells per week (7 days x 12 slots).
pub const CELLS_PER_WEEK: usize = 7 * SLOTS_PER_DAY;

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn cell_index(day: Weekday, slot: u8) -> usize {
    day.num_days_from_monday() as usize * SLOTS_PER_DAY + slot as usize
}

/// Monday on or before `date`.
pub fn week_start_for(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.weekday().num_days_from_monday()))
}

/// Heatmap cell data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub day_of_week: Weekday,
    /// Slot index within the day (0-11).
    pub slot: u8,
    /// First hour covered by the slot.
    pub start_hour: u8,
    /// Hour the slot ends at; 24 for the last slot.
    pub end_hour: u8,
    pub total_minutes: u32,
}

impl HeatmapCell {
    /// Create a new empty cell.
    pub fn new(day_of_week: Weekday, slot: u8) -> Self {
        let start_hour = slot * 2;
        Self {
            day_of_week,
            slot,
            start_hour,
            end_hour: start_hour + 2,
            total_minutes: 0,
        }
    }

    /// Get the character for ASCII heatmap visualization.
    pub fn heat_char(&self) -> char {
        match self.total_minutes {
            0 => ' ',
            1..=30 => '░',
            31..=60 => '▒',
            61..=90 => '▓',
            _ => '█',
        }
    }

    /// Get day name abbreviation.
    pub fn day_name(&self) -> &'static str {
        day_name(self.day_of_week)
    }

    /// Get display coordinates for the cell.
    pub fn coordinates(&self) -> String {
        format!(
            "{} {:02}:00-{:02}:00",
            self.day_name(),
            self.start_hour,
            self.end_hour
        )
    }
}

fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Builds weekly heatmaps from raw sessions.
pub struct WeeklyHeatmapAggregator {
    /// Cells at or above this many minutes are reported as peak slots.
    pub peak_threshold_minutes: u32,
}

impl Default for WeeklyHeatmapAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl WeeklyHeatmapAggregator {
    /// Create a new aggregator with default settings.
    pub fn new() -> Self {
        Self {
            peak_threshold_minutes: 60,
        }
    }

    /// Build the heatmap for the 7 days starting at `week_start`.
    ///
    /// Sessions are clipped to `[week_start, week_start + 7 days)`; anything
    /// outside is ignored. All 84 cells are always present.
    pub fn aggregate_week(&self, sessions: &[FocusSession], week_start: NaiveDate) -> WeeklyHeatmap {
        let window_start = week_start.and_time(NaiveTime::MIN);
        let window_end = window_start + Duration::days(7);

        let clipped: Vec<Interval> = sessions
            .iter()
            .filter_map(|s| clip(s.start, s.end, window_start, window_end))
            .collect();

        let mut heatmap = WeeklyHeatmap::new(week_start);
        for (key, minutes) in allocator::allocate(&clipped, SLOT_MINUTES) {
            let idx = cell_index(key.date.weekday(), key.index as u8);
            heatmap.cells[idx].total_minutes += minutes;
        }

        heatmap.peak_slots = heatmap
            .cells
            .iter()
            .filter(|c| c.total_minutes > 0 && c.total_minutes >= self.peak_threshold_minutes)
            .map(|c| (c.day_of_week, c.slot))
            .collect();

        tracing::debug!(
            %week_start,
            sessions = clipped.len(),
            total_minutes = heatmap.total_minutes(),
            "aggregated weekly heatmap"
        );
        heatmap
    }

    /// Nonzero cells sorted by minutes (descending), cell order on ties.
    pub fn get_peak_slots<'a>(&self, heatmap: &'a WeeklyHeatmap, limit: usize) -> Vec<&'a HeatmapCell> {
        let mut peaks: Vec<&HeatmapCell> = heatmap
            .cells
            .iter()
            .filter(|c| c.total_minutes > 0)
            .collect();

        peaks.sort_by(|a, b| b.total_minutes.cmp(&a.total_minutes));
        peaks.into_iter().take(limit).collect()
    }

    /// Render heatmap as ASCII visualization.
    pub fn render_ascii(&self, heatmap: &WeeklyHeatmap) -> String {
        let mut output = String::new();

        output.push_str(&format!("\nFocus Heatmap: week of {}\n", heatmap.week_start));
        output.push_str(&"=".repeat(44));
        output.push('\n');

        let total = heatmap.total_minutes();
        if total == 0 {
            output.push_str("No focus data for this week.\n");
            return output;
        }

        output.push_str(&format!("Total focus: {} min\n\n", total));

        // Header row with slot start hours
        output.push_str("    ");
        for slot in 0..SLOTS_PER_DAY {
            output.push_str(&format!("{:02} ", slot * 2));
        }
        output.push('\n');

        for day in WEEKDAYS {
            output.push_str(&format!("{:<4}", day_name(day)));
            for slot in 0..SLOTS_PER_DAY {
                let cell = &heatmap.cells[cell_index(day, slot as u8)];
                output.push(cell.heat_char());
                output.push_str("  ");
            }
            output.push_str(&format!("{:>5}\n", heatmap.day_total(day)));
        }

        output.push('\n');
        output.push_str(&"=".repeat(44));
        output.push('\n');
        output.push_str("Legend: ░ (1-30) ▒ (31-60) ▓ (61-90) █ (91+) minutes\n");

        let peaks = self.get_peak_slots(heatmap, 5);
        if !peaks.is_empty() {
            output.push_str("\nPeak slots:\n");
            for cell in peaks {
                output.push_str(&format!(
                    "  {} - {} min\n",
                    cell.coordinates(),
                    cell.total_minutes
                ));
            }
        }

        output
    }
}

/// Complete weekly heatmap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyHeatmap {
    pub week_start: NaiveDate,
    /// All 84 cells, Monday first, then by slot.
    pub cells: Vec<HeatmapCell>,
    /// Cells at or above the aggregator's peak threshold
    pub peak_slots: Vec<(Weekday, u8)>,
}

impl WeeklyHeatmap {
    /// Create a new empty heatmap.
    pub fn new(week_start: NaiveDate) -> Self {
        let cells = WEEKDAYS
            .iter()
            .flat_map(|&day| (0..SLOTS_PER_DAY as u8).map(move |slot| HeatmapCell::new(day, slot)))
            .collect();

        Self {
            week_start,
            cells,
            peak_slots: vec![],
        }
    }

    /// Get cell at specific day/slot.
    pub fn cell(&self, day: Weekday, slot: u8) -> Option<&HeatmapCell> {
        if slot as usize >= SLOTS_PER_DAY {
            return None;
        }
        self.cells.get(cell_index(day, slot))
    }

    /// Total focus minutes for one weekday.
    pub fn day_total(&self, day: Weekday) -> u32 {
        let start = cell_index(day, 0);
        self.cells[start..start + SLOTS_PER_DAY]
            .iter()
            .map(|c| c.total_minutes)
            .sum()
    }

    /// Total focus minutes for one slot across the week.
    pub fn slot_total(&self, slot: u8) -> u32 {
        self.cells
            .iter()
            .skip(slot as usize)
            .step_by(SLOTS_PER_DAY)
            .map(|c| c.total_minutes)
            .sum()
    }

    pub fn total_minutes(&self) -> u32 {
        self.cells.iter().map(|c| c.total_minutes).sum()
    }
}
