//! Assembly of one spreadsheet row per device.

use chrono::SecondsFormat;

use crate::metric::Metric;
use crate::spreadsheet::ReportRow;
use crate::stats::{ValidityPercentages, WindowStats};
use crate::status::DeviceStatus;
use crate::types::{Device, Timestamp};

pub const COL_DEVICE_NAME: &str = "Device name";
pub const COL_UDID: &str = "UDID";
pub const COL_TEMPLATE: &str = "Template";
pub const COL_LAST_SEEN: &str = "Last seen";
pub const COL_MEASUREMENTS: &str = "Measurements";
pub const COL_FUTURE_ROWS: &str = "Future rows";
pub const COL_STATUS: &str = "Status";

/// Everything computed for one device in a run.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceReport {
    pub device: Device,
    pub stats: WindowStats,
    pub percentages: ValidityPercentages,
    pub status: DeviceStatus,
}

impl DeviceReport {
    pub fn to_row(&self) -> ReportRow {
        let mut row = ReportRow::new()
            .with(COL_DEVICE_NAME, self.device.name.as_str())
            .with(COL_UDID, self.device.udid.as_str())
            .with(COL_TEMPLATE, self.device.template_name.as_str())
            .with(
                COL_LAST_SEEN,
                self.stats
                    .last_timestamp
                    .map(format_timestamp)
                    .unwrap_or_default(),
            )
            .with(COL_MEASUREMENTS, self.percentages.measurements);

        for (metric, fraction) in self.percentages.iter() {
            row.insert(metric.column_header(), fraction);
        }

        row.with(COL_FUTURE_ROWS, self.stats.future_row_count)
            .with(COL_STATUS, self.status.to_string())
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-05-08T12:00:00.000Z`.
pub fn format_timestamp(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
