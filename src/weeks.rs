//! Week bucketing of a calendar month.
//!
//! A month is partitioned into Monday–Sunday reporting weeks. A month that
//! does not start on a Monday gets a partial first week; when it starts on a
//! weekend that partial week runs on to the following Sunday instead of
//! producing a one- or two-day bucket. A trailing bucket shorter than a full
//! week is folded into the week before it (see [`TailPolicy`]), unless that
//! would leave the month with fewer than four weeks.

use chrono::{Datelike, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::config::TailPolicy;
use crate::error::{KpiError, Result};
use crate::models::{Bucket, MonthPlan};

/// Trailing buckets spanning fewer whole days than this are merged.
const MIN_TAIL_SPAN_DAYS: i64 = 6;

/// Merging never reduces a month below this many buckets.
const MIN_BUCKETS: usize = 4;

/// Generate the reporting weeks of `month`/`year` using [`TailPolicy::Merge`].
pub fn generate_weeks(month: u32, year: i32) -> Result<MonthPlan> {
    generate_weeks_with(month, year, TailPolicy::Merge)
}

/// Generate the reporting weeks of `month`/`year` with an explicit tail policy.
pub fn generate_weeks_with(month: u32, year: i32, tail: TailPolicy) -> Result<MonthPlan> {
    let first = first_of_month(year, month)?;
    let days_in_month = days_in_month(year, month)?;
    let last = first + Days::new(u64::from(days_in_month - 1));

    let month_start = first.and_time(NaiveTime::MIN);
    let month_end = end_of_day(last);

    let mut buckets = Vec::with_capacity(6);
    let mut cursor = month_start;
    let mut week_index = 1;

    // Monday = 0
    let weekday = u64::from(first.weekday().num_days_from_monday());
    let first_sunday = match weekday {
        0 => None,
        1..=4 => Some(first + Days::new(6 - weekday)),
        _ => Some(first + Days::new(13 - weekday)),
    };

    if let Some(sunday) = first_sunday {
        let end = end_of_day(sunday);
        buckets.push(bucket(month_start, end, week_index));
        cursor = end + Duration::seconds(1);
        week_index += 1;
    }

    while cursor <= month_end {
        let end = end_of_day(cursor.date() + Days::new(6)).min(month_end);
        buckets.push(bucket(cursor, end, week_index));
        cursor = end + Duration::seconds(1);
        week_index += 1;
    }

    if tail == TailPolicy::Merge {
        merge_short_tail(&mut buckets);
    }

    Ok(MonthPlan {
        month,
        year,
        month_start,
        month_end,
        days_in_month,
        buckets,
    })
}

/// Number of days in the month: day 28 plus four days always lands in the
/// next month, whose first day minus one is the last day of this one.
pub fn days_in_month(year: i32, month: u32) -> Result<u32> {
    let day_28 = first_of_month(year, month)?
        .with_day(28)
        .ok_or_else(|| invalid_month(month, year))?;
    let next_month = day_28 + Days::new(4);
    let last = next_month
        .with_day(1)
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| invalid_month(month, year))?;
    Ok(last.day())
}

/// The `(month, year)` immediately before the given one.
pub fn previous_month(month: u32, year: i32) -> Result<(u32, i32)> {
    let prev = first_of_month(year, month)?
        .pred_opt()
        .ok_or_else(|| invalid_month(month, year))?;
    Ok((prev.month(), prev.year()))
}

fn merge_short_tail(buckets: &mut Vec<Bucket>) {
    if buckets.len() <= MIN_BUCKETS {
        return;
    }
    let short = buckets
        .last()
        .map(|b| b.span_days() < MIN_TAIL_SPAN_DAYS)
        .unwrap_or(false);
    if short {
        if let Some(tail) = buckets.pop() {
            if let Some(prev) = buckets.last_mut() {
                prev.end = tail.end;
            }
        }
    }
}

fn bucket(start: NaiveDateTime, end: NaiveDateTime, week_index: u32) -> Bucket {
    Bucket {
        start,
        end,
        week_index,
        month_label: start.format("%B").to_string(),
    }
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN))
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| invalid_month(month, year))
}

fn invalid_month(month: u32, year: i32) -> KpiError {
    KpiError::InvalidArgument(format!("no such month: {year}-{month:02}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(2024, 2).unwrap(), 29);
        assert_eq!(days_in_month(2023, 2).unwrap(), 28);
        assert_eq!(days_in_month(1900, 2).unwrap(), 28);
        assert_eq!(days_in_month(2000, 2).unwrap(), 29);
        assert_eq!(days_in_month(2024, 4).unwrap(), 30);
        assert_eq!(days_in_month(2024, 12).unwrap(), 31);
    }

    #[test]
    fn previous_month_wraps_year() {
        assert_eq!(previous_month(1, 2024).unwrap(), (12, 2023));
        assert_eq!(previous_month(3, 2024).unwrap(), (2, 2024));
    }

    #[test]
    fn invalid_month_is_rejected() {
        assert!(matches!(generate_weeks(13, 2024), Err(KpiError::InvalidArgument(_))));
        assert!(matches!(generate_weeks(0, 2024), Err(KpiError::InvalidArgument(_))));
    }

    #[test]
    fn weekend_start_absorbs_into_second_sunday() {
        // June 2024 starts on a Saturday.
        let plan = generate_weeks(6, 2024).unwrap();
        let first = &plan.buckets[0];
        assert_eq!(first.start, date(2024, 6, 1).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(first.end, date(2024, 6, 9).and_hms_opt(23, 59, 59).unwrap());
        assert_eq!(plan.buckets[1].week_index, 2);

        // September 2024 starts on a Sunday.
        let plan = generate_weeks(9, 2024).unwrap();
        assert_eq!(
            plan.buckets[0].end,
            date(2024, 9, 8).and_hms_opt(23, 59, 59).unwrap()
        );
    }

    #[test]
    fn short_february_keeps_four_weeks() {
        // February 2025 starts on a Saturday: 1-9, 10-16, 17-23, 24-28.
        let plan = generate_weeks(2, 2025).unwrap();
        assert_eq!(plan.buckets.len(), 4);
        let last = plan.buckets.last().unwrap();
        assert_eq!(last.start, date(2025, 2, 24).and_time(NaiveTime::MIN));
        assert_eq!(last.end, end_of_day(date(2025, 2, 28)));
    }
}
