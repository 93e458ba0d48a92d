//! Shared test fixtures for the shipment KPI integration tests.
//!
//! `setup_sample_db()` creates an in-memory DuckDB connection with the
//! warehouse schema and loads a small set of orders and activity-log rows
//! through NDJSON temp files.
//!
//! Sample orders (all times UTC):
//!
//! | actor | created            | status | gmv    | transaction value |
//! |-------|--------------------|--------|--------|-------------------|
//! | u1    | 2023-12-20 10:00   | 500    | 100.00 | 100.00            |
//! | u2    | 2024-01-03 09:00   | 703    |  50.00 |  50.00            |
//! | u1    | 2024-01-09 12:00   | 500    | 200.00 | 200.00            |
//! | u2    | 2024-01-10 08:30   | 702    |  80.00 |  80.00            |
//! | u3    | 2024-01-11 15:00   | 350    | 120.00 | 120.00            |
//! | u3    | 2024-01-12 18:45   | 703    |  60.00 |  60.00            |
//! | u4    | 2024-01-20 11:00   | 500    |  40.00 |  40.00            |
//!
//! Activity: u1 twice and u5 once during 2024-01-08..14, u2 on 2024-01-02.

#![allow(dead_code)]

use chrono::NaiveDate;
use shipment_kpi::models::TimeWindow;
use shipment_kpi::Connection;
use std::io::Write;
use tempfile::NamedTempFile;

/// Epoch seconds for a UTC calendar instant.
pub fn ts(y: i32, m: u32, d: u32, h: u32, mi: u32) -> i64 {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, mi, 0)
        .unwrap()
        .and_utc()
        .timestamp()
}

/// Week 2 of January 2024: Monday the 8th through Sunday the 14th.
pub fn second_week_of_january() -> TimeWindow {
    TimeWindow::new(ts(2024, 1, 8, 0, 0), ts(2024, 1, 15, 0, 0) - 1)
}

pub fn setup_sample_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.ensure_schema().unwrap();
    register_orders(&conn);
    register_user_logs(&conn);
    conn
}

/// Connection with the schema but no rows.
pub fn setup_empty_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.ensure_schema().unwrap();
    conn
}

fn order(id: i64, actor: &str, created_at: i64, status: i32, value: f64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "created_by": actor,
        "created_at": created_at,
        "status": status,
        "gmv_shipment": value,
        "transaction_value": value
    })
}

fn register_orders(conn: &Connection) {
    let orders = vec![
        order(1, "u1", ts(2023, 12, 20, 10, 0), 500, 100.0),
        order(2, "u2", ts(2024, 1, 3, 9, 0), 703, 50.0),
        order(3, "u1", ts(2024, 1, 9, 12, 0), 500, 200.0),
        order(4, "u2", ts(2024, 1, 10, 8, 30), 702, 80.0),
        order(5, "u3", ts(2024, 1, 11, 15, 0), 350, 120.0),
        order(6, "u3", ts(2024, 1, 12, 18, 45), 703, 60.0),
        order(7, "u4", ts(2024, 1, 20, 11, 0), 500, 40.0),
    ];

    write_ndjson_and_append(conn, "shipment_orders", &orders);
}

fn register_user_logs(conn: &Connection) {
    let logs = vec![
        serde_json::json!({"user_id": "u1", "created_at": ts(2024, 1, 9, 7, 0)}),
        serde_json::json!({"user_id": "u1", "created_at": ts(2024, 1, 10, 7, 0)}),
        serde_json::json!({"user_id": "u5", "created_at": ts(2024, 1, 13, 21, 0)}),
        serde_json::json!({"user_id": "u2", "created_at": ts(2024, 1, 2, 7, 0)}),
    ];

    write_ndjson_and_append(conn, "user_logs", &logs);
}

/// Write rows as NDJSON to a temp file and append them to `table_name`.
pub fn write_ndjson_and_append(conn: &Connection, table_name: &str, rows: &[serde_json::Value]) {
    let mut file = NamedTempFile::new().unwrap();
    for row in rows {
        writeln!(file, "{}", serde_json::to_string(row).unwrap()).unwrap();
    }
    file.flush().unwrap();

    let path = file.path().to_str().unwrap();
    conn.append_ndjson(table_name, path).unwrap();
}
