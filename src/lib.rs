//! Weekly and monthly shipment sales KPIs over a DuckDB order warehouse.
//!
//! A month is split into Monday-aligned reporting weeks ([`weeks`]). Each
//! week is aggregated against the `shipment_orders` / `user_logs` tables
//! (GMV, in-transit orders, returning and new transactors, active users,
//! AOV, COD return rate), accumulated into a month-to-date GMV with a linear
//! month-end run-rate, and compared with the preceding month ([`aggregate`]).
//!
//! # Quick start
//!
//! ```no_run
//! use shipment_kpi::KpiClient;
//!
//! let client = KpiClient::builder().database("warehouse.duckdb").build().unwrap();
//!
//! let report = client.monthly_report(2, 2024).unwrap();
//! for row in &report.current.rows {
//!     println!("week {}: {}", row.bucket.week_index, row.facts.gmv_final);
//! }
//! println!("avg GMV vs last month: {:?}", report.comparison.avg_gmv);
//! ```

pub mod aggregate;
#[cfg(feature = "async")]
pub mod async_client;
pub mod config;
pub mod connection;
pub mod error;
pub mod models;
pub mod queries;
pub mod sql_builder;
pub mod weeks;

pub use aggregate::{Aggregator, FactSource};
#[cfg(feature = "async")]
pub use async_client::AsyncKpiClient;
pub use config::{ReportConfig, TailPolicy};
pub use connection::Connection;
pub use error::{KpiError, Result};
pub use sql_builder::SqlBuilder;
pub use weeks::{generate_weeks, generate_weeks_with};

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::models::{MonthAggregate, MonthlyReport, WindowReport};

// ---------------------------------------------------------------------------
// KpiClientBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`KpiClient`].
#[derive(Default)]
pub struct KpiClientBuilder {
    database: Option<PathBuf>,
    config: ReportConfig,
    create_schema: bool,
}

impl KpiClientBuilder {
    /// Path of the DuckDB database file. When not set, an in-memory
    /// database is used.
    pub fn database<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.database = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn config(mut self, config: ReportConfig) -> Self {
        self.config = config;
        self
    }

    /// Create the warehouse tables if they do not exist yet. Defaults to `false`.
    pub fn create_schema(mut self, create: bool) -> Self {
        self.create_schema = create;
        self
    }

    /// Open the database and validate the config.
    pub fn build(self) -> Result<KpiClient> {
        self.config.offset()?;
        let conn = match &self.database {
            Some(path) => Connection::open(path)?,
            None => Connection::open_in_memory()?,
        };
        if self.create_schema {
            conn.ensure_schema()?;
        }
        Ok(KpiClient {
            conn,
            config: self.config,
            database: self.database,
        })
    }
}

// ---------------------------------------------------------------------------
// KpiClient
// ---------------------------------------------------------------------------

/// Owns the warehouse connection for the whole of an aggregation run.
pub struct KpiClient {
    conn: Connection,
    config: ReportConfig,
    database: Option<PathBuf>,
}

impl KpiClient {
    pub fn builder() -> KpiClientBuilder {
        KpiClientBuilder::default()
    }

    /// Wrap an already-open connection.
    pub fn from_connection(conn: Connection, config: ReportConfig) -> Result<Self> {
        config.offset()?;
        Ok(Self {
            conn,
            config,
            database: None,
        })
    }

    /// Access the order-fact query interface.
    pub fn orders(&self) -> queries::OrderQuery<'_> {
        queries::OrderQuery::new(&self.conn)
    }

    /// Access the activity-log query interface.
    pub fn activity(&self) -> queries::ActivityQuery<'_> {
        queries::ActivityQuery::new(&self.conn)
    }

    /// An [`Aggregator`] reading from this client's warehouse.
    pub fn aggregator(&self) -> Aggregator<'_, queries::OrderQuery<'_>> {
        Aggregator::new(self.orders(), &self.config)
    }

    /// Weekly rows and summary for one month.
    pub fn aggregate_month(&self, month: u32, year: i32) -> Result<MonthAggregate> {
        self.aggregator().aggregate_month(month, year)
    }

    /// Weekly rows for the month, the prior month's totals, and the deltas.
    pub fn monthly_report(&self, month: u32, year: i32) -> Result<MonthlyReport> {
        self.aggregator().monthly_report(month, year)
    }

    /// Aggregates for an arbitrary inclusive date range.
    pub fn window_report(&self, start_date: NaiveDate, end_date: NaiveDate) -> Result<WindowReport> {
        self.aggregator().window_report(start_date, end_date)
    }

    /// Execute a raw SQL query against the warehouse.
    pub fn sql(
        &self,
        query: &str,
        params: &[duckdb::types::Value],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        self.conn.execute(query, params)
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Return a reference to the underlying [`Connection`].
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl fmt::Display for KpiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let database = self
            .database
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| ":memory:".to_string());
        write!(
            f,
            "KpiClient(database={}, tables=[{}], utc_offset={}s)",
            database,
            self.conn.tables().join(", "),
            self.config.utc_offset_seconds
        )
    }
}
