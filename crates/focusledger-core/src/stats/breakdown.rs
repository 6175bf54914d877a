//! On-demand hour-by-hour view of a single day, computed from raw sessions.

use chrono::{Duration, NaiveDate, NaiveTime};

use crate::allocator::{self, clip, Interval};
use crate::history::{HOURS_PER_DAY, MAX_MINUTES_PER_HOUR};
use crate::session_log::FocusSession;

/// Focus minutes for each hour of `date`.
///
/// Sessions are clipped to the day, allocated into hours, and each hour is
/// capped at 60 minutes. The cap also absorbs duplicate or overlapping
/// session records. Hours without focus are 0.
pub fn daily_breakdown(sessions: &[FocusSession], date: NaiveDate) -> [u32; HOURS_PER_DAY] {
    let day_start = date.and_time(NaiveTime::MIN);
    let day_end = day_start + Duration::days(1);

    let clipped: Vec<Interval> = sessions
        .iter()
        .filter_map(|s| clip(s.start, s.end, day_start, day_end))
        .collect();

    let mut hours = [0u32; HOURS_PER_DAY];
    for (key, minutes) in allocator::allocate(&clipped, 60) {
        if key.date != date {
            continue;
        }
        let hour = &mut hours[key.index as usize];
        *hour = (*hour + minutes).min(MAX_MINUTES_PER_HOUR);
    }
    hours
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn session(start: &str, end: &str) -> FocusSession {
        FocusSession::new(dt(start), dt(end), "pomodoro")
    }

    fn tuesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 17).unwrap()
    }

    #[test]
    fn sums_overlap_per_hour() {
        let hours = daily_breakdown(
            &[
                session("2026-02-17 09:10:00", "2026-02-17 09:35:00"),
                session("2026-02-17 09:45:00", "2026-02-17 10:20:00"),
            ],
            tuesday(),
        );

        assert_eq!(hours[9], 40);
        assert_eq!(hours[10], 20);
        assert_eq!(hours.iter().sum::<u32>(), 60);
    }

    #[test]
    fn clips_sessions_to_the_day() {
        let hours = daily_breakdown(
            &[
                session("2026-02-16 23:30:00", "2026-02-17 00:45:00"),
                session("2026-02-17 23:40:00", "2026-02-18 01:00:00"),
            ],
            tuesday(),
        );

        assert_eq!(hours[0], 45);
        assert_eq!(hours[23], 20);
        assert_eq!(hours.iter().sum::<u32>(), 65);
    }

    #[test]
    fn caps_each_hour_at_sixty() {
        let hours = daily_breakdown(
            &[
                session("2026-02-17 14:00:00", "2026-02-17 15:00:00"),
                session("2026-02-17 14:00:00", "2026-02-17 15:00:00"),
                session("2026-02-17 14:15:00", "2026-02-17 14:45:00"),
            ],
            tuesday(),
        );
        assert_eq!(hours[14], 60);
    }

    #[test]
    fn ignores_other_days_and_invalid_sessions() {
        let hours = daily_breakdown(
            &[
                session("2026-02-18 09:00:00", "2026-02-18 10:00:00"),
                session("2026-02-17 11:00:00", "2026-02-17 10:00:00"),
            ],
            tuesday(),
        );
        assert_eq!(hours, [0; HOURS_PER_DAY]);
    }
}
