//! Symbolic lookback ranges.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// A lookback window ending today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeSpec {
    #[default]
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "6m")]
    Last6Months,
    #[serde(rename = "1y")]
    Last1Year,
}

impl RangeSpec {
    pub const ALL: [RangeSpec; 4] = [
        RangeSpec::Last7Days,
        RangeSpec::Last30Days,
        RangeSpec::Last6Months,
        RangeSpec::Last1Year,
    ];

    pub fn day_count(self) -> u32 {
        match self {
            RangeSpec::Last7Days => 7,
            RangeSpec::Last30Days => 30,
            RangeSpec::Last6Months => 180,
            RangeSpec::Last1Year => 365,
        }
    }

    /// Earliest date included in the range: `today - day_count`.
    pub fn cutoff(self, today: NaiveDate) -> NaiveDate {
        today
            .checked_sub_days(Days::new(u64::from(self.day_count())))
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn token(self) -> &'static str {
        match self {
            RangeSpec::Last7Days => "7d",
            RangeSpec::Last30Days => "30d",
            RangeSpec::Last6Months => "6m",
            RangeSpec::Last1Year => "1y",
        }
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for RangeSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "7d" | "last7days" | "week" => Ok(RangeSpec::Last7Days),
            "30d" | "last30days" | "month" => Ok(RangeSpec::Last30Days),
            "6m" | "180d" | "last6months" => Ok(RangeSpec::Last6Months),
            "1y" | "365d" | "last1year" | "year" => Ok(RangeSpec::Last1Year),
            other => Err(format!(
                "unknown range '{other}' (expected one of 7d, 30d, 6m, 1y)"
            )),
        }
    }
}
