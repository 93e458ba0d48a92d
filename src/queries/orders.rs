//! Order-fact queries against the DuckDB `shipment_orders` and `user_logs` tables.

use duckdb::types::Value;

use crate::aggregate::FactSource;
use crate::config::{
    COD_SETTLED_STATUSES, FINAL_STATUSES, IN_TRANSIT_FROM, IN_TRANSIT_UNTIL, ORDERS_TABLE,
    STATUS_COD_RETURNED, USER_LOGS_TABLE,
};
use crate::error::{KpiError, Result};
use crate::models::{TimeWindow, WindowFacts, WindowTotals};
use crate::sql_builder::SqlBuilder;

use super::{decimal_col, int_col, status_list};

// ---------------------------------------------------------------------------
// OrderQuery
// ---------------------------------------------------------------------------

/// Windowed KPI aggregation over `shipment_orders`.
pub struct OrderQuery<'a> {
    conn: &'a crate::connection::Connection,
}

impl<'a> OrderQuery<'a> {
    /// Create a new `OrderQuery` bound to the given connection.
    pub fn new(conn: &'a crate::connection::Connection) -> Self {
        Self { conn }
    }

    /// Every KPI aggregate for `window` in a single statement.
    ///
    /// `$1`/`$2` bound the window, `$3`/`$4` the comparison window. Returning
    /// actors have any order before `$1`; new actors have no order inside
    /// the comparison window. The two lookups are independent, so an actor
    /// can be counted by both.
    pub fn window_facts(&self, window: TimeWindow, comparison: TimeWindow) -> Result<WindowFacts> {
        let sql = format!(
            r#"
            WITH window_orders AS (
                SELECT created_by, status, gmv_shipment, transaction_value
                FROM {orders}
                WHERE created_at >= $1 AND created_at <= $2
            ),
            earlier_actors AS (
                SELECT DISTINCT created_by
                FROM {orders}
                WHERE created_at < $1
            ),
            comparison_actors AS (
                SELECT DISTINCT created_by
                FROM {orders}
                WHERE created_at >= $3 AND created_at <= $4
            )
            SELECT
                COALESCE(SUM(CASE WHEN w.status IN ({final_statuses}) THEN w.gmv_shipment END), 0) AS gmv_final_status,
                COUNT(CASE WHEN w.status >= {transit_from} AND w.status < {transit_until} THEN 1 END) AS order_qty,
                COUNT(DISTINCT CASE WHEN e.created_by IS NOT NULL THEN w.created_by END) AS r_trx_user,
                COUNT(DISTINCT CASE WHEN c.created_by IS NULL THEN w.created_by END) AS n_trx_user,
                (SELECT COUNT(DISTINCT ul.user_id)
                 FROM {user_logs} ul
                 WHERE ul.created_at >= $1 AND ul.created_at <= $2) AS active_user,
                COUNT(DISTINCT w.created_by) AS trx_user,
                AVG(w.transaction_value) AS aov,
                COUNT(CASE WHEN w.status = {cod_returned} THEN 1 END) AS cod_returned,
                COUNT(CASE WHEN w.status IN ({cod_settled}) THEN 1 END) AS cod_settled
            FROM window_orders w
            LEFT JOIN earlier_actors e ON e.created_by = w.created_by
            LEFT JOIN comparison_actors c ON c.created_by = w.created_by
            "#,
            orders = ORDERS_TABLE,
            user_logs = USER_LOGS_TABLE,
            final_statuses = status_list(&FINAL_STATUSES),
            transit_from = IN_TRANSIT_FROM,
            transit_until = IN_TRANSIT_UNTIL,
            cod_returned = STATUS_COD_RETURNED,
            cod_settled = status_list(&COD_SETTLED_STATUSES),
        );

        let params = [
            Value::BigInt(window.start),
            Value::BigInt(window.end),
            Value::BigInt(comparison.start),
            Value::BigInt(comparison.end),
        ];
        let row = self
            .conn
            .execute_one(&sql, &params)?
            .ok_or_else(|| KpiError::MalformedRow("window aggregate returned no row".into()))?;

        Ok(WindowFacts {
            gmv_final: decimal_col(&row, "gmv_final_status")?.unwrap_or_default(),
            order_qty: int_col(&row, "order_qty")?,
            returning_trx_users: int_col(&row, "r_trx_user")?,
            new_trx_users: int_col(&row, "n_trx_user")?,
            active_users: int_col(&row, "active_user")?,
            distinct_trx_users: int_col(&row, "trx_user")?,
            aov: decimal_col(&row, "aov")?,
            cod_returned: int_col(&row, "cod_returned")?,
            cod_settled: int_col(&row, "cod_settled")?,
        })
    }

    /// GMV, in-transit order count and AOV for `window`.
    pub fn window_totals(&self, window: TimeWindow) -> Result<WindowTotals> {
        let gmv = format!(
            "COALESCE(SUM(CASE WHEN status IN ({}) THEN gmv_shipment END), 0) AS gmv_final_status",
            status_list(&FINAL_STATUSES)
        );
        let qty = format!(
            "COUNT(CASE WHEN status >= {} AND status < {} THEN 1 END) AS order_qty",
            IN_TRANSIT_FROM, IN_TRANSIT_UNTIL
        );
        let (sql, params) = SqlBuilder::new(ORDERS_TABLE)
            .select(&[gmv.as_str(), qty.as_str(), "AVG(transaction_value) AS aov"])
            .where_between("created_at", window.start, window.end)
            .build();

        let row = self
            .conn
            .execute_one(&sql, &params)?
            .ok_or_else(|| KpiError::MalformedRow("window totals returned no row".into()))?;

        Ok(WindowTotals {
            gmv_final: decimal_col(&row, "gmv_final_status")?.unwrap_or_default(),
            order_qty: int_col(&row, "order_qty")?,
            aov: decimal_col(&row, "aov")?,
        })
    }

    /// Number of orders created in `window` whose status is one of `statuses`.
    pub fn count_in_status(&self, window: TimeWindow, statuses: &[i32]) -> Result<i64> {
        let (sql, params) = SqlBuilder::new(ORDERS_TABLE)
            .select(&["COUNT(*) AS orders"])
            .where_between("created_at", window.start, window.end)
            .where_in("status", statuses)
            .build();

        let row = self
            .conn
            .execute_one(&sql, &params)?
            .ok_or_else(|| KpiError::MalformedRow("status count returned no row".into()))?;
        int_col(&row, "orders")
    }
}

impl FactSource for OrderQuery<'_> {
    fn window_facts(&self, window: TimeWindow, comparison: TimeWindow) -> Result<WindowFacts> {
        OrderQuery::window_facts(self, window, comparison)
    }

    fn window_totals(&self, window: TimeWindow) -> Result<WindowTotals> {
        OrderQuery::window_totals(self, window)
    }
}
