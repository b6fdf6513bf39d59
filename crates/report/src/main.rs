//! `devhealth-report` -- device data-quality report job.
//!
//! Lists devices from the registry database, computes validity statistics
//! for each device's measurement stream over a trailing window, writes a
//! tab-separated report and optionally mails it.
//!
//! See [`AppConfig`] and its parts for the environment variables read.
//! Exits non-zero when the run fails; a report that was written but could
//! not be mailed still exits zero.

use devhealth_db::MySqlDataSource;
use devhealth_mail::ReportMailer;
use devhealth_report::{AppConfig, FileReportSink, MailOutcome, ReportJob};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "devhealth_report=info,devhealth_db=info,devhealth_mail=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    tracing::info!(
        window_days = config.job.window_days,
        threshold = config.job.status_threshold,
        timeout_ms = config.job.batch_timeout_ms(),
        concurrency = config.job.concurrency,
        mail_enabled = config.mail.is_some(),
        "Starting devhealth-report",
    );

    let source = MySqlDataSource::connect(&config.db)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to connect to database");
            std::process::exit(1);
        });

    let sink = FileReportSink::new(config.mail.map(ReportMailer::new));
    let job = ReportJob::new(&source, &sink, config.job);

    let result = job.run(chrono::Utc::now()).await;
    source.close().await;

    match result {
        Ok(outcome) => {
            if let MailOutcome::Failed(reason) = &outcome.mail {
                tracing::warn!(reason = %reason, "Run finished with undelivered mail");
            }
            tracing::info!(path = %outcome.path.display(), "Run finished");
        }
        Err(e) => {
            tracing::error!(error = %e, udid = e.udid(), "Report run failed");
            std::process::exit(1);
        }
    }
}
