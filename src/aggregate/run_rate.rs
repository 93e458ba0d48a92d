//! Running GMV accumulation, month-end projection and period comparison.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::error::{KpiError, Result};
use crate::models::{PercentDelta, PeriodComparison, PeriodSummary};

/// Week index whose projection stands for the month in a [`PeriodSummary`].
const SUMMARY_WEEK: u32 = 4;

/// Month-to-date GMV threaded through the bucket fold.
///
/// The projection is a linear run-rate: cumulative GMV divided by the days
/// elapsed since the first of the month, scaled to the month length. It is
/// not a forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunRate {
    month_start: NaiveDate,
    days_in_month: u32,
    cumulative: Decimal,
}

/// Cumulative and projected GMV after one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection {
    pub cumulative_gmv: Decimal,
    pub projected_gmv: Decimal,
}

impl RunRate {
    pub fn new(month_start: NaiveDate, days_in_month: u32) -> Self {
        Self {
            month_start,
            days_in_month,
            cumulative: Decimal::ZERO,
        }
    }

    pub fn cumulative(&self) -> Decimal {
        self.cumulative
    }

    /// Add one bucket's GMV and project to month end as of `bucket_end`.
    pub fn advance(self, gmv: Decimal, bucket_end: NaiveDateTime) -> Result<(Self, Projection)> {
        let cumulative = self
            .cumulative
            .checked_add(gmv)
            .ok_or_else(|| overflow("cumulative GMV"))?;

        let days_elapsed = (bucket_end.date() - self.month_start).num_days() + 1;
        if days_elapsed < 1 {
            return Err(KpiError::InvalidArgument(format!(
                "bucket ending {bucket_end} precedes month start {}",
                self.month_start
            )));
        }

        let projected_gmv = cumulative
            .checked_div(Decimal::from(days_elapsed))
            .and_then(|per_day| per_day.checked_mul(Decimal::from(self.days_in_month)))
            .ok_or_else(|| overflow("projected GMV"))?;

        let next = Self { cumulative, ..self };
        Ok((
            next,
            Projection {
                cumulative_gmv: cumulative,
                projected_gmv,
            },
        ))
    }
}

/// One bucket's contribution to a [`PeriodSummary`].
#[derive(Debug, Clone, Copy)]
pub struct SummaryInput {
    pub week_index: u32,
    pub gmv: Decimal,
    pub order_qty: i64,
    pub projected_gmv: Decimal,
}

/// Average GMV, month-end projection and average order count over a month's
/// buckets. An empty month averages to zero with no projection.
pub fn summarize<I>(rows: I) -> Result<PeriodSummary>
where
    I: IntoIterator<Item = SummaryInput>,
{
    let mut count: i64 = 0;
    let mut gmv_total = Decimal::ZERO;
    let mut order_total: i64 = 0;
    let mut week_four: Option<Decimal> = None;
    let mut max_projected: Option<Decimal> = None;

    for row in rows {
        count += 1;
        gmv_total = gmv_total
            .checked_add(row.gmv)
            .ok_or_else(|| overflow("GMV total"))?;
        order_total += row.order_qty;
        if row.week_index == SUMMARY_WEEK {
            week_four = Some(week_four.map_or(row.projected_gmv, |p| p.max(row.projected_gmv)));
        }
        max_projected = Some(max_projected.map_or(row.projected_gmv, |p| p.max(row.projected_gmv)));
    }

    if count == 0 {
        return Ok(PeriodSummary {
            avg_gmv: Decimal::ZERO,
            projected_gmv: None,
            avg_order_qty: Decimal::ZERO,
        });
    }

    let n = Decimal::from(count);
    Ok(PeriodSummary {
        avg_gmv: gmv_total / n,
        projected_gmv: week_four.or(max_projected),
        avg_order_qty: Decimal::from(order_total) / n,
    })
}

/// `(current - prior) / prior * 100`, undefined for a zero or missing base.
pub fn percent_delta(current: Option<Decimal>, prior: Option<Decimal>) -> PercentDelta {
    match (current, prior) {
        (Some(cur), Some(base)) if !base.is_zero() => (cur - base)
            .checked_div(base)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .map(PercentDelta::Defined)
            .unwrap_or(PercentDelta::Undefined),
        _ => PercentDelta::Undefined,
    }
}

pub fn compare(current: &PeriodSummary, prior: &PeriodSummary) -> PeriodComparison {
    PeriodComparison {
        avg_gmv: percent_delta(Some(current.avg_gmv), Some(prior.avg_gmv)),
        projected_gmv: percent_delta(current.projected_gmv, prior.projected_gmv),
        avg_order_qty: percent_delta(Some(current.avg_order_qty), Some(prior.avg_order_qty)),
    }
}

fn overflow(what: &str) -> KpiError {
    KpiError::Arithmetic(format!("{what} overflowed decimal range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn end_of(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap()
    }

    #[test]
    fn run_rate_projects_linearly() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let acc = RunRate::new(start, 29);

        let (acc, first) = acc.advance(dec!(400), end_of(2024, 2, 4)).unwrap();
        assert_eq!(first.cumulative_gmv, dec!(400));
        assert_eq!(first.projected_gmv, dec!(2900));

        let (acc, second) = acc.advance(dec!(300), end_of(2024, 2, 11)).unwrap();
        assert_eq!(second.cumulative_gmv, dec!(700));
        // 700 / 11 * 29
        assert_eq!(second.projected_gmv, dec!(700) / dec!(11) * dec!(29));
        assert_eq!(acc.cumulative(), dec!(700));
    }

    #[test]
    fn run_rate_rejects_bucket_before_month() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let acc = RunRate::new(start, 29);
        assert!(acc.advance(dec!(1), end_of(2024, 1, 30)).is_err());
    }

    #[test]
    fn summary_prefers_week_four_projection() {
        let rows = [
            SummaryInput { week_index: 1, gmv: dec!(100), order_qty: 2, projected_gmv: dec!(900) },
            SummaryInput { week_index: 4, gmv: dec!(200), order_qty: 4, projected_gmv: dec!(500) },
            SummaryInput { week_index: 5, gmv: dec!(300), order_qty: 6, projected_gmv: dec!(700) },
        ];
        let summary = summarize(rows).unwrap();
        assert_eq!(summary.avg_gmv, dec!(200));
        assert_eq!(summary.avg_order_qty, dec!(4));
        assert_eq!(summary.projected_gmv, Some(dec!(500)));
    }

    #[test]
    fn summary_falls_back_to_max_projection() {
        let rows = [
            SummaryInput { week_index: 1, gmv: dec!(10), order_qty: 1, projected_gmv: dec!(40) },
            SummaryInput { week_index: 2, gmv: dec!(10), order_qty: 1, projected_gmv: dec!(60) },
        ];
        assert_eq!(summarize(rows).unwrap().projected_gmv, Some(dec!(60)));
    }

    #[test]
    fn empty_summary_has_no_projection() {
        let summary = summarize(Vec::new()).unwrap();
        assert_eq!(summary.projected_gmv, None);
        assert_eq!(summary.avg_gmv, Decimal::ZERO);
    }

    #[test]
    fn delta_against_zero_or_missing_base_is_undefined() {
        assert_eq!(percent_delta(Some(dec!(10)), Some(Decimal::ZERO)), PercentDelta::Undefined);
        assert_eq!(percent_delta(Some(dec!(10)), None), PercentDelta::Undefined);
        assert_eq!(percent_delta(None, Some(dec!(10))), PercentDelta::Undefined);
    }

    #[test]
    fn delta_is_percentage_change() {
        assert_eq!(percent_delta(Some(dec!(150)), Some(dec!(100))), PercentDelta::Defined(dec!(50)));
        assert_eq!(percent_delta(Some(dec!(75)), Some(dec!(100))), PercentDelta::Defined(dec!(-25)));
    }
}
