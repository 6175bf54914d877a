//! Range-bounded focus insights over daily records.

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::history::{DailyFocusRecord, HourlyHistory};

use super::range::RangeSpec;

/// One hour of one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusSlot {
    pub date: NaiveDate,
    pub hour: u8,
    pub minutes: u32,
}

/// Summary of recorded focus within a range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FocusInsights {
    pub average_per_day: f64,
    pub total_minutes: u64,
    pub best_slot: Option<FocusSlot>,
    pub worst_slot: Option<FocusSlot>,
    /// Dates with a record in the range, not the calendar span.
    pub day_count: u32,
}

/// Computes [`FocusInsights`] relative to a fixed "today".
#[derive(Debug, Clone, Copy)]
pub struct InsightsCalculator {
    today: NaiveDate,
}

impl InsightsCalculator {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Calculator anchored to the local date.
    pub fn local() -> Self {
        Self::new(Local::now().date_naive())
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Insights over the history's records within `range`.
    pub fn calculate_for_range(&self, history: &HourlyHistory, range: RangeSpec) -> FocusInsights {
        self.calculate(history.records(), range)
    }

    /// Insights over `records` dated on or after `range.cutoff(today)`.
    ///
    /// Records sharing a date are merged hour by hour (each hour capped at
    /// 60). Records are scanned in date order; the best slot is the first
    /// maximum and the worst slot the first nonzero minimum.
    pub fn calculate<'a, I>(&self, records: I, range: RangeSpec) -> FocusInsights
    where
        I: IntoIterator<Item = &'a DailyFocusRecord>,
    {
        let cutoff = range.cutoff(self.today);
        let mut by_date: BTreeMap<NaiveDate, DailyFocusRecord> = BTreeMap::new();
        for record in records.into_iter().filter(|r| r.date >= cutoff) {
            match by_date.get_mut(&record.date) {
                Some(existing) => {
                    existing.merge(record);
                }
                None => {
                    by_date.insert(record.date, record.clone());
                }
            }
        }

        let mut insights = FocusInsights::default();
        for record in by_date.values() {
            insights.total_minutes += u64::from(record.total_minutes);

            for (hour, &minutes) in record.hourly.iter().enumerate() {
                let slot = || FocusSlot {
                    date: record.date,
                    hour: hour as u8,
                    minutes,
                };

                if minutes > insights.best_slot.as_ref().map_or(0, |s| s.minutes) {
                    insights.best_slot = Some(slot());
                }
                if minutes > 0
                    && insights
                        .worst_slot
                        .as_ref()
                        .map_or(true, |s| minutes < s.minutes)
                {
                    insights.worst_slot = Some(slot());
                }
            }
        }

        insights.day_count = by_date.len() as u32;
        if insights.day_count > 0 {
            insights.average_per_day = insights.total_minutes as f64 / f64::from(insights.day_count);
        }
        insights
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn record(d: &str, hours: &[(usize, u32)]) -> DailyFocusRecord {
        let mut record = DailyFocusRecord::empty(date(d));
        for &(hour, minutes) in hours {
            record.add_minutes(hour, minutes);
        }
        record
    }

    #[test]
    fn counts_only_days_with_records() {
        // Today is Saturday 2026-02-21; Mon=30, Wed=45, Fri absent
        let calc = InsightsCalculator::new(date("2026-02-21"));
        let records = vec![
            record("2026-02-16", &[(9, 30)]),
            record("2026-02-18", &[(10, 45)]),
        ];

        let insights = calc.calculate(&records, RangeSpec::Last7Days);
        assert_eq!(insights.day_count, 2);
        assert_eq!(insights.total_minutes, 75);
        assert_eq!(insights.average_per_day, 37.5);
    }

    #[test]
    fn same_date_records_are_merged() {
        let calc = InsightsCalculator::new(date("2026-02-21"));
        let records = vec![
            record("2026-02-18", &[(9, 20)]),
            record("2026-02-18", &[(9, 50), (14, 10)]),
        ];

        let insights = calc.calculate(&records, RangeSpec::Last7Days);
        assert_eq!(insights.day_count, 1);
        assert_eq!(insights.total_minutes, 70);
        assert_eq!(insights.best_slot.unwrap().minutes, 60);
        assert_eq!(insights.worst_slot.unwrap().hour, 14);
    }

    #[test]
    fn empty_history_degrades_to_zero() {
        let calc = InsightsCalculator::new(date("2026-02-21"));
        let insights = calc.calculate(&Vec::<DailyFocusRecord>::new(), RangeSpec::Last30Days);

        assert_eq!(insights.day_count, 0);
        assert_eq!(insights.total_minutes, 0);
        assert_eq!(insights.average_per_day, 0.0);
        assert!(insights.best_slot.is_none());
        assert!(insights.worst_slot.is_none());
    }

    #[test]
    fn records_before_cutoff_are_excluded() {
        let calc = InsightsCalculator::new(date("2026-02-21"));
        let records = vec![
            record("2026-02-13", &[(9, 50)]),
            record("2026-02-14", &[(9, 20)]),
        ];

        let insights = calc.calculate(&records, RangeSpec::Last7Days);
        // cutoff = 2026-02-14, inclusive
        assert_eq!(insights.day_count, 1);
        assert_eq!(insights.total_minutes, 20);
    }

    #[test]
    fn best_and_worst_take_first_in_scan_order() {
        let calc = InsightsCalculator::new(date("2026-02-21"));
        let records = vec![
            record("2026-02-18", &[(8, 5), (14, 50)]),
            record("2026-02-16", &[(9, 50), (15, 5)]),
        ];

        let insights = calc.calculate(&records, RangeSpec::Last7Days);

        let best = insights.best_slot.unwrap();
        assert_eq!(best.date, date("2026-02-16"));
        assert_eq!(best.hour, 9);
        assert_eq!(best.minutes, 50);

        let worst = insights.worst_slot.unwrap();
        assert_eq!(worst.date, date("2026-02-16"));
        assert_eq!(worst.hour, 15);
        assert_eq!(worst.minutes, 5);
    }

    #[test]
    fn all_zero_records_have_no_slots() {
        let calc = InsightsCalculator::new(date("2026-02-21"));
        let records = vec![DailyFocusRecord::empty(date("2026-02-20"))];

        let insights = calc.calculate(&records, RangeSpec::Last7Days);
        assert_eq!(insights.day_count, 1);
        assert!(insights.best_slot.is_none());
        assert!(insights.worst_slot.is_none());
    }

    #[test]
    fn calculate_for_range_reads_history() {
        use crate::session_log::FocusSession;
        use chrono::NaiveDateTime;

        let dt = |s: &str| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap();
        let mut history = HourlyHistory::new();
        history.ingest(&[FocusSession::new(
            dt("2026-02-20 09:00:00"),
            dt("2026-02-20 10:30:00"),
            "pomodoro",
        )]);

        let insights = InsightsCalculator::new(date("2026-02-21"))
            .calculate_for_range(&history, RangeSpec::Last7Days);
        assert_eq!(insights.total_minutes, 90);
        assert_eq!(insights.best_slot.unwrap().hour, 9);
        assert_eq!(insights.worst_slot.unwrap().hour, 10);
    }
}
