//! Interval bucket allocator.
//!
//! Splits arbitrary wall-clock intervals into fixed-size calendar buckets
//! aligned from midnight and converts the per-bucket overlap into whole
//! minutes with the largest-remainder method, so that the minutes handed
//! out always add up to `floor(total overlap / 60s)`.
//!
//! The same allocator backs the hourly history (60-minute buckets), the
//! weekly heatmap (120-minute buckets) and the daily hour breakdown.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Minutes in a calendar day.
pub const MINUTES_PER_DAY: u32 = 1440;

const MS_PER_MINUTE: i64 = 60_000;

/// A half-open wall-clock interval `[start, end)`.
pub type Interval = (NaiveDateTime, NaiveDateTime);

/// Identifies one bucket: a calendar date and the bucket's position within
/// that day (0-based, counted from midnight).
///
/// Ordering is date first, then index, which is also the tie-break order
/// used when distributing leftover minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BucketKey {
    pub date: NaiveDate,
    pub index: u32,
}

impl BucketKey {
    pub fn new(date: NaiveDate, index: u32) -> Self {
        Self { date, index }
    }

    /// Wall-clock start of this bucket.
    pub fn start(&self, bucket_minutes: u32) -> NaiveDateTime {
        self.date.and_time(NaiveTime::MIN)
            + Duration::minutes(i64::from(self.index) * i64::from(bucket_minutes))
    }

    /// Packed integer key: `day_ordinal * buckets_per_day + index`.
    ///
    /// Consecutive buckets have consecutive ordinals, across day boundaries.
    pub fn ordinal(&self, bucket_minutes: u32) -> i64 {
        i64::from(self.date.num_days_from_ce()) * i64::from(buckets_per_day(bucket_minutes))
            + i64::from(self.index)
    }
}

/// Number of buckets in one day for the given bucket size.
///
/// # Panics
/// Panics if `bucket_minutes` is zero or does not divide a day evenly.
/// Both are programmer errors, not data errors.
pub fn buckets_per_day(bucket_minutes: u32) -> u32 {
    assert!(
        bucket_minutes > 0 && MINUTES_PER_DAY % bucket_minutes == 0,
        "bucket size must be a positive divisor of {MINUTES_PER_DAY} minutes, got {bucket_minutes}"
    );
    MINUTES_PER_DAY / bucket_minutes
}

/// Clip `[start, end)` to `[window_start, window_end)`.
///
/// Returns `None` when nothing of the interval remains inside the window.
pub fn clip(
    start: NaiveDateTime,
    end: NaiveDateTime,
    window_start: NaiveDateTime,
    window_end: NaiveDateTime,
) -> Option<Interval> {
    let clipped_start = start.max(window_start);
    let clipped_end = end.min(window_end);
    (clipped_end > clipped_start).then_some((clipped_start, clipped_end))
}

/// Accumulate overlap, in milliseconds, of every interval with every bucket
/// it touches.
///
/// Intervals with `end <= start` contribute nothing.
pub fn overlap_millis(intervals: &[Interval], bucket_minutes: u32) -> BTreeMap<BucketKey, i64> {
    let per_day = buckets_per_day(bucket_minutes);
    let bucket_ms = i64::from(bucket_minutes) * MS_PER_MINUTE;
    let mut overlaps: BTreeMap<BucketKey, i64> = BTreeMap::new();

    for &(start, end) in intervals {
        if end <= start {
            tracing::debug!(%start, %end, "skipping empty or inverted interval");
            continue;
        }

        let mut cursor = start;
        while cursor < end {
            let date = cursor.date();
            let midnight = date.and_time(NaiveTime::MIN);
            let offset_ms = (cursor - midnight).num_milliseconds();
            // Leap-second timestamps can sit past the last bucket of the day.
            let index = ((offset_ms / bucket_ms) as u32).min(per_day - 1);
            let bucket_end = midnight + Duration::milliseconds((i64::from(index) + 1) * bucket_ms);
            let segment_end = bucket_end.min(end);

            let ms = (segment_end - cursor).num_milliseconds();
            if ms > 0 {
                *overlaps.entry(BucketKey::new(date, index)).or_insert(0) += ms;
            }
            cursor = segment_end;
        }
    }

    overlaps
}

/// Turn per-key overlap milliseconds into whole minutes.
///
/// Each key first gets `floor(ms / 60s)`. The minutes lost to flooring are
/// then handed out one at a time to the keys with the largest leftover,
/// ties going to the smaller key. Keys ending at zero minutes are dropped.
pub fn largest_remainder<K>(overlaps: &BTreeMap<K, i64>) -> BTreeMap<K, u32>
where
    K: Ord + Copy,
{
    let total_ms: i64 = overlaps.values().sum();
    let total_minutes = total_ms / MS_PER_MINUTE;

    let mut minutes: BTreeMap<K, u32> = overlaps
        .iter()
        .map(|(key, ms)| (*key, (ms / MS_PER_MINUTE) as u32))
        .collect();

    let floored: i64 = minutes.values().map(|&m| i64::from(m)).sum();
    let remainder = (total_minutes - floored) as usize;

    if remainder > 0 {
        let mut leftovers: Vec<(K, i64)> = overlaps
            .iter()
            .map(|(key, ms)| (*key, ms % MS_PER_MINUTE))
            .filter(|(_, leftover)| *leftover > 0)
            .collect();
        leftovers.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        for (key, _) in leftovers.into_iter().take(remainder) {
            if let Some(m) = minutes.get_mut(&key) {
                *m += 1;
            }
        }
    }

    minutes.retain(|_, m| *m > 0);

    debug_assert_eq!(
        minutes.values().map(|&m| i64::from(m)).sum::<i64>(),
        total_minutes
    );
    minutes
}

/// Allocate the whole-minute duration of `intervals` across buckets of
/// `bucket_minutes` minutes.
///
/// The result is sparse: buckets receiving zero minutes are absent. The sum
/// of all values equals `floor(total overlap / 60s)` exactly.
///
/// # Panics
/// Panics if `bucket_minutes` is zero or does not divide a day evenly.
pub fn allocate(intervals: &[Interval], bucket_minutes: u32) -> BTreeMap<BucketKey, u32> {
    largest_remainder(&overlap_millis(intervals, bucket_minutes))
}
