//! Measurement stream rows.

use devhealth_core::Timestamp;
use sqlx::FromRow;

/// The most recent row of a stream at or before the report time.
#[derive(Debug, Clone, FromRow)]
pub struct LatestReading {
    pub timestamp: Timestamp,
    pub battery: Option<f64>,
}
