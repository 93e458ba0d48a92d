//! Per-bucket KPI aggregation over a month, and the month-over-month report.
//!
//! Buckets are processed strictly in chronological order: each bucket's
//! query completes before the next starts, and the running GMV is threaded
//! through a [`RunRate`] value. Any query failure aborts the whole month;
//! no partial row sequence is ever returned.

pub mod run_rate;

use chrono::{FixedOffset, NaiveDate, NaiveTime};
use tracing::{debug, info};

use crate::config::ReportConfig;
use crate::error::{KpiError, Result};
use crate::models::{
    MetricRow, MonthAggregate, MonthTotals, MonthlyReport, TimeWindow, TotalsRow, WindowFacts,
    WindowReport, WindowTotals,
};
use crate::weeks::{generate_weeks_with, previous_month};

pub use run_rate::{compare, percent_delta, summarize, Projection, RunRate, SummaryInput};

// ---------------------------------------------------------------------------
// FactSource
// ---------------------------------------------------------------------------

/// Windowed aggregation over order facts.
pub trait FactSource {
    /// Full aggregate set for `window`. New transactors are the ones with no
    /// order inside `comparison`.
    fn window_facts(&self, window: TimeWindow, comparison: TimeWindow) -> Result<WindowFacts>;

    /// GMV, order count and AOV only.
    fn window_totals(&self, window: TimeWindow) -> Result<WindowTotals> {
        let facts = self.window_facts(window, window.comparison())?;
        Ok(WindowTotals::from(&facts))
    }
}

impl<T: FactSource + ?Sized> FactSource for &T {
    fn window_facts(&self, window: TimeWindow, comparison: TimeWindow) -> Result<WindowFacts> {
        (**self).window_facts(window, comparison)
    }

    fn window_totals(&self, window: TimeWindow) -> Result<WindowTotals> {
        (**self).window_totals(window)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check month and year bounds, reporting every violation at once.
pub fn validate_month_year(month: u32, year: i32, config: &ReportConfig) -> Result<()> {
    let mut errors = Vec::new();
    if !(1..=12).contains(&month) {
        errors.push(format!("month must be between 1 and 12, got {month}"));
    }
    if year < config.min_year || year > config.max_year {
        errors.push(format!(
            "year must be between {} and {}, got {year}",
            config.min_year, config.max_year
        ));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(KpiError::InvalidArgument(errors.join("; ")))
    }
}

/// Check that a single-window report range is ordered.
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        return Err(KpiError::InvalidArgument(format!(
            "start date {start} is after end date {end}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Folds fact-source results over the weeks of a month.
pub struct Aggregator<'a, S: FactSource> {
    source: S,
    config: &'a ReportConfig,
}

impl<'a, S: FactSource> Aggregator<'a, S> {
    pub fn new(source: S, config: &'a ReportConfig) -> Self {
        Self { source, config }
    }

    /// One [`MetricRow`] per week of the month plus the month summary.
    pub fn aggregate_month(&self, month: u32, year: i32) -> Result<MonthAggregate> {
        validate_month_year(month, year, self.config)?;
        let offset = self.config.offset()?;
        let plan = generate_weeks_with(month, year, self.config.tail_policy)?;

        let mut run_rate = RunRate::new(plan.month_start.date(), plan.days_in_month);
        let mut rows = Vec::with_capacity(plan.buckets.len());

        for bucket in &plan.buckets {
            let window = bucket.window(offset);
            let comparison = window.comparison();
            debug!(
                week = bucket.week_index,
                start = window.start,
                end = window.end,
                "querying week facts"
            );
            let facts = self.source.window_facts(window, comparison)?;

            let (next, projection) = run_rate.advance(facts.gmv_final, bucket.end)?;
            run_rate = next;

            rows.push(MetricRow {
                bucket: bucket.clone(),
                total_trx_users: facts.total_trx_users(),
                cod_rts: facts.cod_return_rate(),
                cumulative_gmv: projection.cumulative_gmv,
                projected_gmv: projection.projected_gmv,
                facts,
            });
        }

        let summary = summarize(rows.iter().map(|r| SummaryInput {
            week_index: r.bucket.week_index,
            gmv: r.facts.gmv_final,
            order_qty: r.facts.order_qty,
            projected_gmv: r.projected_gmv,
        }))?;

        info!(
            month,
            year,
            weeks = rows.len(),
            cumulative_gmv = %run_rate.cumulative(),
            "aggregated month"
        );

        Ok(MonthAggregate { plan, rows, summary })
    }

    /// Same fold as [`aggregate_month`](Self::aggregate_month) over the
    /// reduced [`WindowTotals`] query.
    pub fn aggregate_month_totals(&self, month: u32, year: i32) -> Result<MonthTotals> {
        validate_month_year(month, year, self.config)?;
        let offset = self.config.offset()?;
        let plan = generate_weeks_with(month, year, self.config.tail_policy)?;

        let mut run_rate = RunRate::new(plan.month_start.date(), plan.days_in_month);
        let mut rows = Vec::with_capacity(plan.buckets.len());

        for bucket in &plan.buckets {
            let window = bucket.window(offset);
            debug!(week = bucket.week_index, start = window.start, end = window.end, "querying week totals");
            let totals = self.source.window_totals(window)?;

            let (next, projection) = run_rate.advance(totals.gmv_final, bucket.end)?;
            run_rate = next;

            rows.push(TotalsRow {
                bucket: bucket.clone(),
                totals,
                cumulative_gmv: projection.cumulative_gmv,
                projected_gmv: projection.projected_gmv,
            });
        }

        let summary = summarize(rows.iter().map(|r| SummaryInput {
            week_index: r.bucket.week_index,
            gmv: r.totals.gmv_final,
            order_qty: r.totals.order_qty,
            projected_gmv: r.projected_gmv,
        }))?;

        info!(month, year, weeks = rows.len(), "aggregated month totals");

        Ok(MonthTotals { plan, rows, summary })
    }

    /// The month, the month before it, and percentage deltas between them.
    pub fn monthly_report(&self, month: u32, year: i32) -> Result<MonthlyReport> {
        validate_month_year(month, year, self.config)?;
        let current = self.aggregate_month(month, year)?;

        let (prev_month, prev_year) = previous_month(month, year)?;
        // The prior month is only a comparison base, so the year bound
        // applies to the requested month alone.
        let prior_config = ReportConfig {
            min_year: self.config.min_year.min(prev_year),
            ..self.config.clone()
        };
        let prior = Aggregator::new(&self.source, &prior_config)
            .aggregate_month_totals(prev_month, prev_year)?;

        let comparison = compare(&current.summary, &prior.summary);
        Ok(MonthlyReport {
            current,
            prior,
            comparison,
        })
    }

    /// Aggregates for the inclusive date range `[start_date, end_date]`.
    pub fn window_report(&self, start_date: NaiveDate, end_date: NaiveDate) -> Result<WindowReport> {
        validate_date_range(start_date, end_date)?;
        let offset: FixedOffset = self.config.offset()?;

        let start = start_date.and_time(NaiveTime::MIN);
        let end = end_date
            .and_hms_opt(23, 59, 59)
            .ok_or_else(|| KpiError::InvalidArgument(format!("bad end date {end_date}")))?;
        let window = TimeWindow::from_naive(start, end, offset);
        let comparison = window.comparison();

        debug!(start = window.start, end = window.end, "querying window facts");
        let facts = self.source.window_facts(window, comparison)?;

        Ok(WindowReport {
            start_date,
            end_date,
            days_in_period: (end_date - start_date).num_days() + 1,
            window,
            comparison,
            total_trx_users: facts.total_trx_users(),
            cod_rts: facts.cod_return_rate(),
            facts,
        })
    }
}

/// [`Aggregator::aggregate_month`] with the default [`ReportConfig`].
pub fn aggregate_month<S: FactSource>(month: u32, year: i32, source: S) -> Result<MonthAggregate> {
    let config = ReportConfig::default();
    Aggregator::new(source, &config).aggregate_month(month, year)
}
