//! Activity-log queries against the DuckDB `user_logs` table.

use crate::config::USER_LOGS_TABLE;
use crate::error::{KpiError, Result};
use crate::models::TimeWindow;
use crate::sql_builder::SqlBuilder;

use super::int_col;

/// Query interface for user activity backed by `user_logs`.
pub struct ActivityQuery<'a> {
    conn: &'a crate::connection::Connection,
}

impl<'a> ActivityQuery<'a> {
    pub fn new(conn: &'a crate::connection::Connection) -> Self {
        Self { conn }
    }

    /// Distinct users with at least one log entry inside `window`.
    pub fn active_users(&self, window: TimeWindow) -> Result<i64> {
        let (sql, params) = SqlBuilder::new(USER_LOGS_TABLE)
            .select(&["COUNT(DISTINCT user_id) AS active_user"])
            .where_between("created_at", window.start, window.end)
            .build();

        let row = self
            .conn
            .execute_one(&sql, &params)?
            .ok_or_else(|| KpiError::MalformedRow("active user count returned no row".into()))?;
        int_col(&row, "active_user")
    }
}
