pub mod metrics;
pub mod period;

pub use metrics::*;
pub use period::*;
