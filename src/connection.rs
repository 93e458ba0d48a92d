//! DuckDB connection wrapper with schema setup and query execution.
//!
//! Rows come back as `HashMap<String, serde_json::Value>`. DECIMAL columns
//! are rendered as JSON strings so no precision is lost on the way to
//! `rust_decimal`.

use crate::config::{ORDERS_TABLE, USER_LOGS_TABLE};
use crate::error::{KpiError, Result};
use duckdb::{
    types::{Value, ValueRef},
    Connection as DuckDbConnection,
};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;

/// Wraps a DuckDB connection holding the order-fact warehouse tables.
pub struct Connection {
    conn: DuckDbConnection,
    known_tables: RefCell<HashSet<String>>,
}

impl Connection {
    /// Open an in-memory DuckDB database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = DuckDbConnection::open_in_memory()?;
        Ok(Self::wrap(conn))
    }

    /// Open (or create) a DuckDB database file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = DuckDbConnection::open(path)?;
        Ok(Self::wrap(conn))
    }

    fn wrap(conn: DuckDbConnection) -> Self {
        Self {
            conn,
            known_tables: RefCell::new(HashSet::new()),
        }
    }

    /// Create the `shipment_orders` and `user_logs` tables if missing.
    pub fn ensure_schema(&self) -> Result<()> {
        self.conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {ORDERS_TABLE} (\
                 id BIGINT, \
                 created_by VARCHAR, \
                 created_at BIGINT, \
                 status INTEGER, \
                 gmv_shipment DECIMAL(18, 2), \
                 transaction_value DECIMAL(18, 2)\
             ); \
             CREATE TABLE IF NOT EXISTS {USER_LOGS_TABLE} (\
                 user_id VARCHAR, \
                 created_at BIGINT\
             );"
        ))?;
        let mut known = self.known_tables.borrow_mut();
        known.insert(ORDERS_TABLE.to_string());
        known.insert(USER_LOGS_TABLE.to_string());
        Ok(())
    }

    /// Execute SQL and return results as a `Vec` of `HashMap`s.
    pub fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows_result = stmt.query(duckdb::params_from_iter(params.iter()))?;

        // Column metadata is only available after execution.
        let stmt_ref = rows_result
            .as_ref()
            .ok_or_else(|| KpiError::MalformedRow("statement metadata unavailable".into()))?;
        let column_names: Vec<String> = stmt_ref
            .column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        let column_count = stmt_ref.column_count();

        let mut out: Vec<HashMap<String, serde_json::Value>> = Vec::new();

        while let Some(row) = rows_result.next()? {
            let mut map = HashMap::with_capacity(column_count);
            for (i, col_name) in column_names.iter().enumerate().take(column_count) {
                map.insert(col_name.clone(), convert_value_ref(row.get_ref(i)?));
            }
            out.push(map);
        }

        Ok(out)
    }

    /// Execute SQL and return the first row, or `None` for an empty result.
    pub fn execute_one(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<Option<HashMap<String, serde_json::Value>>> {
        Ok(self.execute(sql, params)?.into_iter().next())
    }

    /// Execute SQL and return the first column of the first row.
    pub fn execute_scalar(&self, sql: &str, params: &[Value]) -> Result<Option<serde_json::Value>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(duckdb::params_from_iter(params.iter()))?;

        if let Some(row) = rows.next()? {
            Ok(Some(convert_value_ref(row.get_ref(0)?)))
        } else {
            Ok(None)
        }
    }

    /// Replace `table_name` with the contents of a newline-delimited JSON file.
    ///
    /// Column types are inferred by DuckDB.
    pub fn register_table_from_ndjson(&self, table_name: &str, ndjson_path: &str) -> Result<()> {
        let path_fwd = ndjson_path.replace('\\', "/");
        self.conn.execute_batch(&format!(
            "DROP TABLE IF EXISTS {}; \
             CREATE TABLE {} AS SELECT * FROM read_json_auto('{}', format='newline_delimited')",
            table_name, table_name, path_fwd
        ))?;
        self.known_tables.borrow_mut().insert(table_name.to_string());
        debug!(table = table_name, path = %path_fwd, "registered table from ndjson");
        Ok(())
    }

    /// Append rows from a newline-delimited JSON file to an existing table,
    /// matching columns by name and casting to the table's types.
    pub fn append_ndjson(&self, table_name: &str, ndjson_path: &str) -> Result<usize> {
        let path_fwd = ndjson_path.replace('\\', "/");
        let inserted = self.conn.execute(
            &format!(
                "INSERT INTO {} BY NAME SELECT * FROM read_json_auto('{}', format='newline_delimited')",
                table_name, path_fwd
            ),
            [],
        )?;
        debug!(table = table_name, rows = inserted, "appended ndjson rows");
        Ok(inserted)
    }

    /// Check whether a table was created or registered through this connection.
    pub fn has_table(&self, name: &str) -> bool {
        self.known_tables.borrow().contains(name)
    }

    pub fn tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self.known_tables.borrow().iter().cloned().collect();
        names.sort();
        names
    }

    /// Access the underlying DuckDB connection for advanced usage.
    pub fn raw(&self) -> &DuckDbConnection {
        &self.conn
    }
}

/// Convert a DuckDB `ValueRef` to a `serde_json::Value`.
fn convert_value_ref(val: ValueRef<'_>) -> serde_json::Value {
    match val {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Boolean(b) => serde_json::Value::Bool(b),
        ValueRef::TinyInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::SmallInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::Int(n) => serde_json::Value::Number(n.into()),
        ValueRef::BigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::UTinyInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::USmallInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::UInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::UBigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::HugeInt(n) => {
            // HugeInt may not fit in i64; try i64, fallback to string
            if let Ok(i) = i64::try_from(n) {
                serde_json::Value::Number(i.into())
            } else {
                serde_json::Value::String(n.to_string())
            }
        }
        ValueRef::Float(f) => serde_json::Number::from_f64(f as f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Double(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Decimal(d) => serde_json::Value::String(d.to_string()),
        ValueRef::Text(bytes) => serde_json::Value::String(String::from_utf8_lossy(bytes).to_string()),
        _ => serde_json::Value::Null,
    }
}
