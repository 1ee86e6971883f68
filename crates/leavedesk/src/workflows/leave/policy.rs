use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Day of the year from which carried-over vacation days are forfeited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryOverCutoff {
    month: u32,
    day: u32,
}

impl CarryOverCutoff {
    pub const APRIL_FIRST: CarryOverCutoff = CarryOverCutoff { month: 4, day: 1 };

    /// Rejects days that do not exist in every year (e.g. 29 February).
    pub fn new(month: u32, day: u32) -> Option<Self> {
        // 2023 is not a leap year, so this also rules out 02-29.
        NaiveDate::from_ymd_opt(2023, month, day)?;
        Some(Self { month, day })
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn date_in(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
    }

    /// The "before April" flag: carry-over is still usable on `date`.
    pub fn is_before(&self, date: NaiveDate) -> bool {
        self.date_in(date.year())
            .map(|cutoff| date < cutoff)
            .unwrap_or(false)
    }
}

impl Default for CarryOverCutoff {
    fn default() -> Self {
        Self::APRIL_FIRST
    }
}

/// Tunables of the leave workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeavePolicy {
    pub carry_over_cutoff: CarryOverCutoff,
    /// Days an applicant has to wait after applying before reminding the bosses.
    pub remind_after_days: u32,
    pub comment_max_length: usize,
    pub reason_max_length: usize,
}

impl Default for LeavePolicy {
    fn default() -> Self {
        Self {
            carry_over_cutoff: CarryOverCutoff::APRIL_FIRST,
            remind_after_days: 2,
            comment_max_length: 200,
            reason_max_length: 200,
        }
    }
}
