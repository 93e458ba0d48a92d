//! Async wrapper around [`KpiClient`] for use in async runtimes (Tokio, etc.).
//!
//! Runs every operation on the blocking thread pool via
//! [`tokio::task::spawn_blocking`]. Aggregation itself stays sequential;
//! the wrapper only lets a caller bound the whole run with a timeout.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use shipment_kpi::AsyncKpiClient;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let client = AsyncKpiClient::builder()
//!         .database("warehouse.duckdb")
//!         .build()
//!         .await
//!         .unwrap();
//!
//!     let report = client
//!         .monthly_report_with_timeout(2, 2024, Duration::from_secs(60))
//!         .await
//!         .unwrap();
//!     println!("{:?}", report.comparison);
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::ReportConfig;
use crate::error::{KpiError, Result};
use crate::models::{MonthAggregate, MonthlyReport};
use crate::KpiClient;

// ---------------------------------------------------------------------------
// AsyncKpiClientBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`AsyncKpiClient`].
#[derive(Default)]
pub struct AsyncKpiClientBuilder {
    database: Option<PathBuf>,
    config: ReportConfig,
    create_schema: bool,
}

impl AsyncKpiClientBuilder {
    pub fn database<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.database = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn config(mut self, config: ReportConfig) -> Self {
        self.config = config;
        self
    }

    pub fn create_schema(mut self, create: bool) -> Self {
        self.create_schema = create;
        self
    }

    /// Build the client on the blocking thread pool.
    pub async fn build(self) -> Result<AsyncKpiClient> {
        tokio::task::spawn_blocking(move || {
            let mut builder = KpiClient::builder()
                .config(self.config)
                .create_schema(self.create_schema);
            if let Some(path) = self.database {
                builder = builder.database(path);
            }
            let client = builder.build()?;
            Ok(AsyncKpiClient::from_client(client))
        })
        .await
        .map_err(|e| KpiError::InvalidArgument(format!("Task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// AsyncKpiClient
// ---------------------------------------------------------------------------

/// Async wrapper around [`KpiClient`].
///
/// The client is held behind a [`Mutex`] since the DuckDB connection is not
/// `Sync`.
pub struct AsyncKpiClient {
    inner: Arc<Mutex<KpiClient>>,
}

impl AsyncKpiClient {
    pub fn builder() -> AsyncKpiClientBuilder {
        AsyncKpiClientBuilder::default()
    }

    pub fn from_client(client: KpiClient) -> Self {
        Self {
            inner: Arc::new(Mutex::new(client)),
        }
    }

    /// Run a sync client operation on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&KpiClient) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let client = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = client
                .lock()
                .map_err(|_| KpiError::InvalidArgument("client lock poisoned".into()))?;
            f(&guard)
        })
        .await
        .map_err(|e| KpiError::InvalidArgument(format!("Task join error: {e}")))?
    }

    /// Like [`run()`](Self::run), failing with [`KpiError::Timeout`] when the
    /// operation does not finish within `limit`.
    ///
    /// The blocking task is not cancelled; it runs to completion in the
    /// background and holds the client lock until it does.
    pub async fn run_with_timeout<F, T>(&self, limit: Duration, f: F) -> Result<T>
    where
        F: FnOnce(&KpiClient) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        tokio::time::timeout(limit, self.run(f))
            .await
            .map_err(|_| KpiError::Timeout(limit))?
    }

    pub async fn aggregate_month(&self, month: u32, year: i32) -> Result<MonthAggregate> {
        self.run(move |c| c.aggregate_month(month, year)).await
    }

    pub async fn monthly_report(&self, month: u32, year: i32) -> Result<MonthlyReport> {
        self.run(move |c| c.monthly_report(month, year)).await
    }

    /// [`monthly_report`](Self::monthly_report) bounded by `limit`.
    pub async fn monthly_report_with_timeout(
        &self,
        month: u32,
        year: i32,
        limit: Duration,
    ) -> Result<MonthlyReport> {
        self.run_with_timeout(limit, move |c| c.monthly_report(month, year))
            .await
    }
}
