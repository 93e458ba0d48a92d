use std::fs;
use std::path::Path;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::error::{KpiError, Result};

pub const ORDERS_TABLE: &str = "shipment_orders";
pub const USER_LOGS_TABLE: &str = "user_logs";

// Shipment status codes as stored in `shipment_orders.status`.
pub const STATUS_DELIVERED: i32 = 500;
pub const STATUS_COD_RETURNED: i32 = 702;
pub const STATUS_COD_COMPLETED: i32 = 703;

/// Statuses whose shipment value counts towards GMV.
pub const FINAL_STATUSES: [i32; 3] = [STATUS_DELIVERED, STATUS_COD_RETURNED, STATUS_COD_COMPLETED];

/// Statuses that settle a COD shipment (the denominator of the return rate).
pub const COD_SETTLED_STATUSES: [i32; 2] = [STATUS_DELIVERED, STATUS_COD_COMPLETED];

/// In-transit range, lower bound inclusive and upper bound exclusive.
pub const IN_TRANSIT_FROM: i32 = 300;
pub const IN_TRANSIT_UNTIL: i32 = 500;

pub const DEFAULT_MIN_YEAR: i32 = 2000;
pub const DEFAULT_MAX_YEAR: i32 = 2100;

/// What the week generator does with a trailing bucket shorter than a full week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TailPolicy {
    /// Fold the short tail into the second-to-last bucket.
    #[default]
    Merge,
    /// Emit the tail as its own bucket.
    Keep,
}

/// Report-level settings shared by every aggregation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub min_year: i32,
    pub max_year: i32,
    /// Offset applied when converting bucket instants to epoch seconds.
    pub utc_offset_seconds: i32,
    pub tail_policy: TailPolicy,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            min_year: DEFAULT_MIN_YEAR,
            max_year: DEFAULT_MAX_YEAR,
            utc_offset_seconds: 0,
            tail_policy: TailPolicy::Merge,
        }
    }
}

impl ReportConfig {
    /// Load a config from a JSON file. Missing keys fall back to the defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: ReportConfig = serde_json::from_str(&raw)?;
        config.offset()?;
        Ok(config)
    }

    /// The configured offset as a chrono [`FixedOffset`].
    pub fn offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_seconds).ok_or_else(|| {
            KpiError::InvalidArgument(format!(
                "utc_offset_seconds out of range: {}",
                self.utc_offset_seconds
            ))
        })
    }
}
