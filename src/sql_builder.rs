//! SQL builder with parameterized query construction.
//!
//! All values go through DuckDB's parameter binding (`?` placeholders) as
//! typed [`duckdb::types::Value`]s, never through string interpolation.
//! Builder methods return `&mut Self` for chaining.
//!
//! # Example
//!
//! ```rust
//! use shipment_kpi::SqlBuilder;
//! let (sql, params) = SqlBuilder::new("shipment_orders")
//!     .select(&["COUNT(*) AS orders"])
//!     .where_between("created_at", 1_704_067_200, 1_704_671_999)
//!     .build();
//! assert_eq!(params.len(), 2);
//! ```

use duckdb::types::Value;

/// Builds parameterized SQL queries safely.
pub struct SqlBuilder {
    select_cols: Vec<String>,
    from_table: String,
    where_clauses: Vec<String>,
    params: Vec<Value>,
}

impl SqlBuilder {
    /// Create a builder targeting the given table.
    pub fn new(table: &str) -> Self {
        Self {
            select_cols: vec!["*".to_string()],
            from_table: table.to_string(),
            where_clauses: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Set the columns to select (replaces the default `*`).
    pub fn select(&mut self, cols: &[&str]) -> &mut Self {
        self.select_cols = cols.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Add an IN condition over integer codes.
    ///
    /// Empty values list produces `FALSE`.
    pub fn where_in(&mut self, column: &str, values: &[i32]) -> &mut Self {
        if values.is_empty() {
            self.where_clauses.push("FALSE".to_string());
            return self;
        }
        let placeholders: Vec<&str> = values.iter().map(|_| "?").collect();
        self.where_clauses
            .push(format!("{} IN ({})", column, placeholders.join(", ")));
        self.params.extend(values.iter().map(|v| Value::Int(*v)));
        self
    }

    /// Add an inclusive range condition over epoch seconds:
    /// `{column} >= ? AND {column} <= ?`.
    pub fn where_between(&mut self, column: &str, start: i64, end: i64) -> &mut Self {
        self.where_clauses
            .push(format!("{} >= ? AND {} <= ?", column, column));
        self.params.push(Value::BigInt(start));
        self.params.push(Value::BigInt(end));
        self
    }

    /// Build the final SQL string and parameter list.
    pub fn build(&self) -> (String, Vec<Value>) {
        let mut parts = vec![
            format!("SELECT {}", self.select_cols.join(", ")),
            format!("FROM {}", self.from_table),
        ];

        if !self.where_clauses.is_empty() {
            parts.push(format!("WHERE {}", self.where_clauses.join(" AND ")));
        }

        (parts.join("\n"), self.params.clone())
    }
}
