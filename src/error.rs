use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum KpiError {
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Malformed result row: {0}")]
    MalformedRow(String),

    #[error("Arithmetic error: {0}")]
    Arithmetic(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, KpiError>;
