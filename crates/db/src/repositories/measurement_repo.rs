//! Repository for per-device measurement stream tables.
//!
//! Each stream lives in its own table named after the device udid. The
//! window aggregate is generated from the metric bound table, so the SQL
//! applies exactly the bounds the in-memory calculator uses.

use devhealth_core::{Metric, Timestamp, WindowStats};
use sqlx::{MySqlPool, Row};

use crate::models::measurement::LatestReading;

/// Longest identifier MySQL accepts for a table name.
const MAX_TABLE_NAME_LEN: usize = 64;

// ---------------------------------------------------------------------------
// StreamTable
// ---------------------------------------------------------------------------

/// A validated measurement table name.
///
/// Only ASCII alphanumerics, hyphen and underscore are accepted, which
/// keeps the udid safe to interpolate as a quoted identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamTable(String);

impl StreamTable {
    pub fn for_udid(udid: &str) -> Option<Self> {
        let safe = !udid.is_empty()
            && udid.len() <= MAX_TABLE_NAME_LEN
            && udid
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        safe.then(|| Self(udid.to_string()))
    }

    /// Backtick-quoted identifier.
    pub fn quoted(&self) -> String {
        format!("`{}`", self.0)
    }
}

// ---------------------------------------------------------------------------
// MeasurementRepo
// ---------------------------------------------------------------------------

/// Provides window statistics over measurement streams.
pub struct MeasurementRepo;

impl MeasurementRepo {
    /// Compute [`WindowStats`] for one stream over `[window_start, now]`.
    ///
    /// Fails when the table does not exist.
    pub async fn window_stats(
        pool: &MySqlPool,
        table: &StreamTable,
        window_start: Timestamp,
        now: Timestamp,
    ) -> Result<WindowStats, sqlx::Error> {
        let mut stats = WindowStats::default();

        let row = sqlx::query(&Self::window_counts_query(table))
            .bind(window_start)
            .bind(now)
            .fetch_one(pool)
            .await?;
        stats.row_count = count_column(&row, "row_count")?;
        for metric in Metric::ALL {
            stats.valid_counts[metric.index()] = count_column(&row, metric.column())?;
        }

        let future: (i64,) = sqlx::query_as(&Self::future_count_query(table))
            .bind(now)
            .fetch_one(pool)
            .await?;
        stats.future_row_count = non_negative(future.0);

        let latest = sqlx::query_as::<_, LatestReading>(&Self::latest_query(table))
            .bind(now)
            .fetch_optional(pool)
            .await?;
        if let Some(latest) = latest {
            stats.last_timestamp = Some(latest.timestamp);
            stats.last_battery_level = latest.battery;
        }

        Ok(stats)
    }

    /// Row count and per-metric valid counts inside the window.
    ///
    /// Binds: window start, now.
    pub fn window_counts_query(table: &StreamTable) -> String {
        let mut columns = vec!["COUNT(*) AS row_count".to_string()];
        for metric in Metric::ALL {
            let column = metric.column();
            columns.push(format!(
                "COUNT(CASE WHEN {} THEN 1 END) AS {column}",
                metric.bound().sql_predicate(column)
            ));
        }
        format!(
            "SELECT {} FROM {} WHERE `timestamp` BETWEEN ? AND ?",
            columns.join(", "),
            table.quoted()
        )
    }

    /// Rows stamped after the report time. Binds: now.
    pub fn future_count_query(table: &StreamTable) -> String {
        format!(
            "SELECT COUNT(*) FROM {} WHERE `timestamp` > ?",
            table.quoted()
        )
    }

    /// Latest row at or before the report time. Binds: now.
    pub fn latest_query(table: &StreamTable) -> String {
        format!(
            "SELECT `timestamp`, CAST(battery AS DOUBLE) AS battery FROM {} \
             WHERE `timestamp` <= ? ORDER BY `timestamp` DESC LIMIT 1",
            table.quoted()
        )
    }
}

fn count_column(row: &sqlx::mysql::MySqlRow, column: &str) -> Result<u64, sqlx::Error> {
    row.try_get::<i64, _>(column).map(non_negative)
}

fn non_negative(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
