//! Collaborator seams: where devices and measurements come from and where
//! finished reports go.

use std::path::Path;

use async_trait::async_trait;

use crate::error::ReportError;
use crate::stats::WindowStats;
use crate::status::StatusSummary;
use crate::types::{Device, Timestamp};

/// Read access to the device registry and measurement store.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Devices to report on, ordered by name. `filter` is a SQL `LIKE`
    /// pattern matched against the device name.
    async fn list_devices(&self, filter: Option<&str>) -> Result<Vec<Device>, ReportError>;

    /// Statistics for one measurement stream over `[window_start, now]`.
    ///
    /// Fails with [`ReportError::Query`] tagged with `udid` when the stream
    /// is unknown or the query fails.
    async fn window_stats(
        &self,
        udid: &str,
        window_start: Timestamp,
        now: Timestamp,
    ) -> Result<WindowStats, ReportError>;
}

/// Destination for a rendered report.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Persist `content` at `path`, creating parent directories.
    async fn write_report(&self, path: &Path, content: &str) -> Result<(), ReportError>;

    /// Whether [`ReportSink::send_mail`] will actually deliver anything.
    fn mail_enabled(&self) -> bool;

    /// Mail the written report as an attachment.
    async fn send_mail(
        &self,
        attachment: &Path,
        summary: &StatusSummary,
    ) -> Result<(), ReportError>;
}
