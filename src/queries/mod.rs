//! Query modules backed by the DuckDB warehouse.
//!
//! Each module provides a query struct that borrows from a
//! [`Connection`](crate::connection::Connection). Result columns are read
//! out of the JSON row maps with the helpers below.

pub mod activity;
pub mod orders;

pub use activity::ActivityQuery;
pub use orders::OrderQuery;

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::{KpiError, Result};

type Row = HashMap<String, Value>;

/// Read a numeric column as a decimal. SQL NULL maps to `None`.
fn decimal_col(row: &Row, col: &str) -> Result<Option<Decimal>> {
    match row.get(col) {
        None => Err(missing(col)),
        Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Decimal::from_str(s)
            .map(Some)
            .map_err(|e| KpiError::MalformedRow(format!("column {col}: {e}"))),
        Some(Value::Number(n)) => {
            let parsed = match n.as_i64() {
                Some(i) => Some(Decimal::from(i)),
                None => n.as_f64().and_then(Decimal::from_f64),
            };
            parsed
                .map(Some)
                .ok_or_else(|| KpiError::MalformedRow(format!("column {col}: {n} is not a decimal")))
        }
        Some(other) => Err(KpiError::MalformedRow(format!(
            "column {col}: expected a number, got {other}"
        ))),
    }
}

/// Read a count column. Counts are never NULL.
fn int_col(row: &Row, col: &str) -> Result<i64> {
    match row.get(col) {
        None => Err(missing(col)),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| KpiError::MalformedRow(format!("column {col}: {n} is not an integer"))),
        Some(Value::String(s)) => s
            .parse::<i64>()
            .map_err(|e| KpiError::MalformedRow(format!("column {col}: {e}"))),
        Some(other) => Err(KpiError::MalformedRow(format!(
            "column {col}: expected an integer, got {other}"
        ))),
    }
}

fn missing(col: &str) -> KpiError {
    KpiError::MalformedRow(format!("missing column {col}"))
}

/// Render status constants for an SQL `IN (...)` list.
fn status_list(codes: &[i32]) -> String {
    codes
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
