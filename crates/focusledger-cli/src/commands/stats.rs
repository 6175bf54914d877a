use chrono::NaiveDate;
use clap::Subcommand;
use focusledger_core::{week_start_for, Config, DailyFocusRecord, RangeSpec, HOURS_PER_DAY};
use serde::Serialize;

use super::{open_tracker, print_json, today};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Hourly record and peak hour for one day (default: today)
    Day { date: Option<NaiveDate> },
    /// Hourly records for every day in [from, to]
    Range { from: NaiveDate, to: NaiveDate },
    /// Two-hour heatmap for the week starting at a date (default: this Monday)
    Week {
        week_start: Option<NaiveDate>,
        /// Render as a text grid instead of JSON
        #[arg(long)]
        ascii: bool,
    },
    /// Totals, daily average and best/worst hour over a range (7d, 30d, 6m, 1y)
    Insights { range: Option<RangeSpec> },
    /// Per-hour minutes for one day computed from raw sessions (default: today)
    Breakdown { date: Option<NaiveDate> },
    /// Total minutes per session source
    Sources,
}

#[derive(Serialize)]
struct Peak {
    hour: u8,
    minutes: u32,
}

#[derive(Serialize)]
struct Day {
    #[serde(flatten)]
    record: DailyFocusRecord,
    peak: Option<Peak>,
}

#[derive(Serialize)]
struct Breakdown {
    date: NaiveDate,
    total_minutes: u32,
    hours: [u32; HOURS_PER_DAY],
}

#[derive(Serialize)]
struct Insights {
    range: RangeSpec,
    since: NaiveDate,
    #[serde(flatten)]
    insights: focusledger_core::FocusInsights,
}

pub fn run(action: StatsAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = open_tracker(config)?;

    match action {
        StatsAction::Day { date } => {
            let record = tracker.get_day(date.unwrap_or_else(today));
            let peak = record
                .peak_hour()
                .map(|(hour, minutes)| Peak { hour, minutes });
            print_json(&Day { record, peak })?;
        }
        StatsAction::Range { from, to } => {
            if from > to {
                return Err(format!("range start {from} is after range end {to}").into());
            }
            print_json(&tracker.get_range(from, to))?;
        }
        StatsAction::Week { week_start, ascii } => {
            let week_start = week_start.unwrap_or_else(|| week_start_for(today()));
            let heatmap = tracker.aggregate_week(week_start);
            if ascii {
                print!("{}", tracker.heatmap_aggregator().render_ascii(&heatmap));
            } else {
                print_json(&heatmap)?;
            }
        }
        StatsAction::Insights { range } => {
            let range = range.unwrap_or(config.insights.default_range);
            let today = today();
            print_json(&Insights {
                range,
                since: range.cutoff(today),
                insights: tracker.calculate_for_range_at(range, today),
            })?;
        }
        StatsAction::Breakdown { date } => {
            let date = date.unwrap_or_else(today);
            let hours = tracker.daily_breakdown(date);
            print_json(&Breakdown {
                date,
                total_minutes: hours.iter().sum(),
                hours,
            })?;
        }
        StatsAction::Sources => {
            print_json(&tracker.session_log().minutes_by_source())?;
        }
    }
    Ok(())
}
