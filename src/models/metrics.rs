use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::period::{Bucket, MonthPlan, TimeWindow};

// ---------------------------------------------------------------------------
// WindowFacts: Raw aggregates for one window (fact source result)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowFacts {
    /// Shipment value of orders in a final status.
    pub gmv_final: Decimal,
    /// Orders still in transit.
    pub order_qty: i64,
    /// Actors in the window who also ordered at any time before it.
    pub returning_trx_users: i64,
    /// Actors in the window with no order in the comparison window.
    pub new_trx_users: i64,
    pub active_users: i64,
    /// `COUNT(DISTINCT created_by)` over the window.
    pub distinct_trx_users: i64,
    /// Average transaction value over every order in the window; `None` when
    /// the window has no orders.
    pub aov: Option<Decimal>,
    pub cod_returned: i64,
    pub cod_settled: i64,
}

impl WindowFacts {
    /// Returning plus new. The two sets can overlap, so this may exceed
    /// [`distinct_trx_users`](Self::distinct_trx_users).
    pub fn total_trx_users(&self) -> i64 {
        self.returning_trx_users + self.new_trx_users
    }

    pub fn cod_return_rate(&self) -> Decimal {
        cod_return_rate(self.cod_returned, self.cod_settled)
    }
}

/// Returned-to-sender COD shipments over settled COD shipments, 0 when
/// nothing settled.
pub fn cod_return_rate(returned: i64, settled: i64) -> Decimal {
    if settled == 0 {
        Decimal::ZERO
    } else {
        Decimal::from(returned) / Decimal::from(settled)
    }
}

// ---------------------------------------------------------------------------
// WindowTotals: Reduced aggregate set used for the prior month
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowTotals {
    pub gmv_final: Decimal,
    pub order_qty: i64,
    pub aov: Option<Decimal>,
}

impl From<&WindowFacts> for WindowTotals {
    fn from(facts: &WindowFacts) -> Self {
        Self {
            gmv_final: facts.gmv_final,
            order_qty: facts.order_qty,
            aov: facts.aov,
        }
    }
}

// ---------------------------------------------------------------------------
// MetricRow / TotalsRow: One row per bucket
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub bucket: Bucket,
    #[serde(flatten)]
    pub facts: WindowFacts,
    pub total_trx_users: i64,
    pub cod_rts: Decimal,
    /// Month-to-date GMV including this bucket.
    pub cumulative_gmv: Decimal,
    /// Linear run-rate projection of month-end GMV.
    pub projected_gmv: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalsRow {
    pub bucket: Bucket,
    #[serde(flatten)]
    pub totals: WindowTotals,
    pub cumulative_gmv: Decimal,
    pub projected_gmv: Decimal,
}

// ---------------------------------------------------------------------------
// PeriodSummary / PercentDelta / PeriodComparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub avg_gmv: Decimal,
    /// Projection of the week-4 bucket, or the largest projection when there
    /// is no week 4. `None` for a month with no rows.
    pub projected_gmv: Option<Decimal>,
    pub avg_order_qty: Decimal,
}

/// Percentage change against a comparison base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PercentDelta {
    Defined(Decimal),
    /// The comparison base was zero or missing.
    Undefined,
}

impl PercentDelta {
    pub fn value(&self) -> Option<Decimal> {
        match self {
            PercentDelta::Defined(v) => Some(*v),
            PercentDelta::Undefined => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, PercentDelta::Defined(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub avg_gmv: PercentDelta,
    pub projected_gmv: PercentDelta,
    pub avg_order_qty: PercentDelta,
}

// ---------------------------------------------------------------------------
// Report shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthAggregate {
    pub plan: MonthPlan,
    pub rows: Vec<MetricRow>,
    pub summary: PeriodSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthTotals {
    pub plan: MonthPlan,
    pub rows: Vec<TotalsRow>,
    pub summary: PeriodSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub current: MonthAggregate,
    pub prior: MonthTotals,
    pub comparison: PeriodComparison,
}

/// Result of the single-window report mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days_in_period: i64,
    pub window: TimeWindow,
    pub comparison: TimeWindow,
    pub facts: WindowFacts,
    pub total_trx_users: i64,
    pub cod_rts: Decimal,
}
