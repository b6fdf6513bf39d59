//! Report orchestration.
//!
//! [`ReportJob`] lists devices, computes each device's statistics with
//! bounded concurrency under a single batch timeout, renders the rows and
//! hands the result to the sink. Any per-device failure aborts the whole
//! batch and nothing is written.

use std::path::{Path, PathBuf};

use devhealth_core::report::format_timestamp;
use devhealth_core::spreadsheet::TAB;
use devhealth_core::stats::{expected_count, window_start};
use devhealth_core::{
    classify, render_spreadsheet, DataSource, Device, DeviceReport, LastSeen, ReportError,
    ReportRow, ReportSink, StatusSummary, Timestamp, ValidityPercentages,
};
use futures::{StreamExt, TryStreamExt};

use crate::config::JobConfig;

/// What happened to the mail step of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailOutcome {
    /// No mailer configured.
    Skipped,
    Sent,
    /// The report was written but delivery failed.
    Failed(String),
}

/// Result of a run whose report file was written.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub path: PathBuf,
    pub reports: Vec<DeviceReport>,
    pub summary: StatusSummary,
    pub mail: MailOutcome,
}

/// One report run over explicit data-source and sink handles.
pub struct ReportJob<'a> {
    source: &'a dyn DataSource,
    sink: &'a dyn ReportSink,
    config: JobConfig,
}

impl<'a> ReportJob<'a> {
    pub fn new(source: &'a dyn DataSource, sink: &'a dyn ReportSink, config: JobConfig) -> Self {
        Self {
            source,
            sink,
            config,
        }
    }

    /// Run the report as of `now`.
    pub async fn run(&self, now: Timestamp) -> Result<RunOutcome, ReportError> {
        let path = output_path(&self.config.output_dir, now);
        tracing::info!(path = %path.display(), "Output file");

        let devices = self
            .source
            .list_devices(self.config.device_filter.as_deref())
            .await?;
        tracing::info!(
            device_count = devices.len(),
            filter = ?self.config.device_filter,
            "Devices listed"
        );

        let reports = self.collect(&devices, now).await?;

        let rows: Vec<ReportRow> = reports.iter().map(DeviceReport::to_row).collect();
        let content = render_spreadsheet(&rows, TAB);
        self.sink.write_report(&path, &content).await?;

        let summary = StatusSummary::from_statuses(reports.iter().map(|r| &r.status));
        tracing::info!(%summary, "Report complete");

        let mail = if self.sink.mail_enabled() {
            match self.sink.send_mail(&path, &summary).await {
                Ok(()) => MailOutcome::Sent,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        path = %path.display(),
                        "Report written but not mailed"
                    );
                    MailOutcome::Failed(e.to_string())
                }
            }
        } else {
            MailOutcome::Skipped
        };

        Ok(RunOutcome {
            path,
            reports,
            summary,
            mail,
        })
    }

    /// Compute every device's report, preserving directory order.
    ///
    /// At most `concurrency` queries are in flight. The first failure, or
    /// the batch timeout, drops the remaining work and is returned.
    pub async fn collect(
        &self,
        devices: &[Device],
        now: Timestamp,
    ) -> Result<Vec<DeviceReport>, ReportError> {
        let start = window_start(now, self.config.window_days);
        let expected = expected_count(self.config.window_days);

        let batch = futures::stream::iter(devices)
            .map(|device| self.device_report(device, start, now, expected))
            .buffered(self.config.concurrency)
            .try_collect::<Vec<_>>();

        match tokio::time::timeout(self.config.batch_timeout, batch).await {
            Ok(result) => result,
            Err(_) => {
                let after_ms = self.config.batch_timeout_ms();
                tracing::error!(after_ms, devices = devices.len(), "Batch timed out");
                Err(ReportError::Timeout { after_ms })
            }
        }
    }

    async fn device_report(
        &self,
        device: &Device,
        window_start: Timestamp,
        now: Timestamp,
        expected: u64,
    ) -> Result<DeviceReport, ReportError> {
        let stats = self
            .source
            .window_stats(&device.udid, window_start, now)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    udid = %device.udid,
                    device = %device.name,
                    error = %e,
                    "Stats query failed"
                );
            })?;

        let percentages = ValidityPercentages::from_stats(&stats, expected);
        let last_seen = LastSeen {
            timestamp: stats.last_timestamp,
            battery_level: stats.last_battery_level,
        };
        let status = classify(
            &percentages,
            last_seen,
            window_start,
            self.config.status_threshold,
        );

        tracing::debug!(udid = %device.udid, rows = stats.row_count, %status, "Device processed");

        Ok(DeviceReport {
            device: device.clone(),
            stats,
            percentages,
            status,
        })
    }
}

/// `<dir>/<ISO-8601 UTC run timestamp>.tsv`.
pub fn output_path(dir: &Path, now: Timestamp) -> PathBuf {
    dir.join(format!("{}.tsv", format_timestamp(now)))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn output_path_embeds_run_timestamp() {
        let now = Utc.with_ymd_and_hms(2024, 5, 8, 12, 0, 0).unwrap();
        assert_eq!(
            output_path(Path::new("data"), now),
            PathBuf::from("data/2024-05-08T12:00:00.000Z.tsv")
        );
    }
}
