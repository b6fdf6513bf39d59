//! Report delivery via SMTP.
//!
//! [`ReportMailer`] wraps the `lettre` async SMTP transport to send the
//! rendered spreadsheet as an attachment. Configuration is loaded from
//! environment variables; if `SMTP_HOST` or `REPORT_RECIPIENTS` is missing,
//! [`MailConfig::from_env`] returns `Ok(None)` and no mailer should be built.

use std::path::Path;

use devhealth_core::StatusSummary;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for report delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// A recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The attachment could not be read from disk.
    #[error("Failed to read attachment {path}: {source}")]
    Attachment {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A mail setting is present but malformed.
    #[error("Invalid mail configuration: {0}")]
    Config(String),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// MailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@devhealth.local";

/// Default subject when `REPORT_MAIL_SUBJECT` is not set.
const DEFAULT_SUBJECT: &str = "Device health report";

/// MIME type of the attached spreadsheet.
const TSV_CONTENT_TYPE: &str = "text/tab-separated-values";

/// Configuration for the SMTP report mailer.
#[derive(Clone)]
pub struct MailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    pub smtp_password: Option<String>,
    /// Every address the report goes to.
    pub recipients: Vec<String>,
    /// Subject prefix; the attachment name is appended.
    pub subject: String,
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("from_address", &self.from_address)
            .field("smtp_user", &self.smtp_user)
            .field("smtp_password", &self.smtp_password.as_ref().map(|_| "***"))
            .field("recipients", &self.recipients)
            .field("subject", &self.subject)
            .finish()
    }
}

impl MailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `Ok(None)` if `SMTP_HOST` is not set or no recipients are
    /// listed, signalling that mail delivery should be skipped. A malformed
    /// `SMTP_PORT` is an error rather than a silent fallback.
    ///
    /// | Variable              | Required | Default                    |
    /// |-----------------------|----------|----------------------------|
    /// | `SMTP_HOST`           | yes      | --                         |
    /// | `SMTP_PORT`           | no       | `587`                      |
    /// | `SMTP_FROM`           | no       | `noreply@devhealth.local`  |
    /// | `SMTP_USER`           | no       | --                         |
    /// | `SMTP_PASSWORD`       | no       | --                         |
    /// | `REPORT_RECIPIENTS`   | yes      | -- (comma-separated)       |
    /// | `REPORT_MAIL_SUBJECT` | no       | `Device health report`     |
    pub fn from_env() -> Result<Option<Self>, EmailError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`MailConfig::from_env`] but reading from an arbitrary source.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<Self>, EmailError> {
        let Some(smtp_host) = lookup("SMTP_HOST").filter(|h| !h.trim().is_empty()) else {
            return Ok(None);
        };

        let recipients: Vec<String> = lookup("REPORT_RECIPIENTS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if recipients.is_empty() {
            return Ok(None);
        }

        let smtp_port = match lookup("SMTP_PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                EmailError::Config(format!("SMTP_PORT has an invalid value '{raw}'"))
            })?,
            None => DEFAULT_SMTP_PORT,
        };

        Ok(Some(Self {
            smtp_host,
            smtp_port,
            from_address: lookup("SMTP_FROM").unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: lookup("SMTP_USER"),
            smtp_password: lookup("SMTP_PASSWORD"),
            recipients,
            subject: lookup("REPORT_MAIL_SUBJECT").unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
        }))
    }
}

// ---------------------------------------------------------------------------
// ReportMailer
// ---------------------------------------------------------------------------

/// Sends a finished report to the configured recipients via SMTP.
pub struct ReportMailer {
    config: MailConfig,
}

impl ReportMailer {
    /// Create a new mailer with the given configuration.
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }

    /// Read the report at `attachment` and mail it with a summary body.
    pub async fn deliver(
        &self,
        attachment: &Path,
        summary: &StatusSummary,
    ) -> Result<(), EmailError> {
        let content = tokio::fs::read(attachment)
            .await
            .map_err(|source| EmailError::Attachment {
                path: attachment.display().to_string(),
                source,
            })?;
        let filename = attachment
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report.tsv".to_string());

        let email = self.build_message(&filename, content, summary)?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let mailer = transport_builder.build();
        mailer.send(email).await?;

        tracing::info!(
            recipients = self.config.recipients.len(),
            attachment = %filename,
            "Report email sent"
        );
        Ok(())
    }

    /// Assemble the MIME message: a plain-text summary plus the attachment.
    pub fn build_message(
        &self,
        filename: &str,
        content: Vec<u8>,
        summary: &StatusSummary,
    ) -> Result<Message, EmailError> {
        let mut builder = Message::builder()
            .from(self.config.from_address.parse()?)
            .subject(format!("{} {}", self.config.subject, filename));
        for recipient in &self.config.recipients {
            builder = builder.to(recipient.parse()?);
        }

        let body = format!("Report: {filename}\n{summary}\n");
        let content_type =
            ContentType::parse(TSV_CONTENT_TYPE).map_err(|e| EmailError::Build(e.to_string()))?;

        builder
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(body))
                    .singlepart(Attachment::new(filename.to_string()).body(content, content_type)),
            )
            .map_err(|e| EmailError::Build(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
