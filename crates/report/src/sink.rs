//! [`ReportSink`] writing to the local filesystem and mailing over SMTP.

use std::path::Path;

use async_trait::async_trait;
use devhealth_core::{ReportError, ReportSink, StatusSummary};
use devhealth_mail::ReportMailer;

/// Writes reports to disk and, when configured, mails them.
pub struct FileReportSink {
    mailer: Option<ReportMailer>,
}

impl FileReportSink {
    pub fn new(mailer: Option<ReportMailer>) -> Self {
        Self { mailer }
    }
}

#[async_trait]
impl ReportSink for FileReportSink {
    async fn write_report(&self, path: &Path, content: &str) -> Result<(), ReportError> {
        let io_error = |source: std::io::Error| ReportError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        tokio::fs::write(path, content.as_bytes())
            .await
            .map_err(io_error)?;

        tracing::info!(path = %path.display(), bytes = content.len(), "Report written");
        Ok(())
    }

    fn mail_enabled(&self) -> bool {
        self.mailer.is_some()
    }

    async fn send_mail(
        &self,
        attachment: &Path,
        summary: &StatusSummary,
    ) -> Result<(), ReportError> {
        let Some(mailer) = &self.mailer else {
            tracing::debug!("Mail delivery not configured, skipping");
            return Ok(());
        };
        mailer
            .deliver(attachment, summary)
            .await
            .map_err(|e| ReportError::Mail(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn creates_missing_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data").join("nested").join("report.tsv");
        let sink = FileReportSink::new(None);

        sink.write_report(&path, "a\tb\n1\t2")
            .await
            .expect("write should succeed");

        let written = tokio::fs::read_to_string(&path).await.expect("file exists");
        assert_eq!(written, "a\tb\n1\t2");
    }

    #[tokio::test]
    async fn write_failure_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        // A regular file cannot act as a parent directory.
        let blocker = dir.path().join("blocker");
        tokio::fs::write(&blocker, b"x").await.expect("write blocker");
        let sink = FileReportSink::new(None);

        let result = sink.write_report(&blocker.join("report.tsv"), "x").await;
        assert_matches!(result, Err(ReportError::Io { .. }));
    }

    #[tokio::test]
    async fn mail_without_mailer_is_a_no_op() {
        let sink = FileReportSink::new(None);
        assert!(!sink.mail_enabled());
        let result = sink
            .send_mail(Path::new("missing.tsv"), &StatusSummary::default())
            .await;
        assert!(result.is_ok());
    }
}
