//! Domain logic for device data-quality reports.
//!
//! - [`stats`]: per-device window statistics and validity percentages.
//! - [`status`]: health classification of a device.
//! - [`spreadsheet`]: delimited rendering of heterogeneous rows.
//! - [`source`]: traits for the data source and report sink collaborators.

pub mod error;
pub mod metric;
pub mod report;
pub mod source;
pub mod spreadsheet;
pub mod stats;
pub mod status;
pub mod types;

pub use error::ReportError;
pub use metric::{Bound, Metric};
pub use report::DeviceReport;
pub use source::{DataSource, ReportSink};
pub use spreadsheet::{render_spreadsheet, Cell, ReportRow};
pub use stats::{MeasurementSample, ValidityPercentages, WindowStats};
pub use status::{classify, DeviceStatus, LastSeen, StatusSummary};
pub use types::{Device, Timestamp};
