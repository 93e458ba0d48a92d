use chrono::{FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Bucket: One reporting week inside a month
// ---------------------------------------------------------------------------

/// A Monday-aligned reporting week. `end` is inclusive (`23:59:59`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// 1-based position within the month.
    pub week_index: u32,
    /// English month name of `start`, e.g. "February".
    pub month_label: String,
}

impl Bucket {
    /// Whole days between `start` and `end`, truncated.
    ///
    /// A full Monday–Sunday week spans 6 whole days (Monday 00:00:00 to
    /// Sunday 23:59:59).
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Epoch-second bounds of this bucket, interpreting its instants in `offset`.
    pub fn window(&self, offset: FixedOffset) -> TimeWindow {
        TimeWindow::from_naive(self.start, self.end, offset)
    }
}

// ---------------------------------------------------------------------------
// MonthPlan: Output of the week generator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthPlan {
    pub month: u32,
    pub year: i32,
    pub month_start: NaiveDateTime,
    pub month_end: NaiveDateTime,
    pub days_in_month: u32,
    pub buckets: Vec<Bucket>,
}

// ---------------------------------------------------------------------------
// TimeWindow: Inclusive epoch-second range
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}

impl TimeWindow {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Convert calendar instants to epoch seconds, treating them as local
    /// time in `offset`.
    pub fn from_naive(start: NaiveDateTime, end: NaiveDateTime, offset: FixedOffset) -> Self {
        let shift = i64::from(offset.local_minus_utc());
        Self {
            start: start.and_utc().timestamp() - shift,
            end: end.and_utc().timestamp() - shift,
        }
    }

    pub fn width(&self) -> i64 {
        self.end - self.start
    }

    /// The window of identical width immediately preceding this one.
    ///
    /// Its end coincides with this window's start.
    pub fn comparison(&self) -> TimeWindow {
        let c = self.width();
        TimeWindow {
            start: self.start - c,
            end: self.end - c,
        }
    }
}
