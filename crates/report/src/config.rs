use std::path::PathBuf;
use std::time::Duration;

use devhealth_core::stats::DEFAULT_WINDOW_DAYS;
use devhealth_core::status::DEFAULT_STATUS_THRESHOLD;
use devhealth_core::ReportError;
use devhealth_db::DbConfig;
use devhealth_mail::MailConfig;

/// Default wall-clock budget for the whole per-device batch.
const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Longest accepted trailing window, roughly a century.
const MAX_WINDOW_DAYS: u32 = 36_500;

/// Default number of per-device queries in flight at once.
const DEFAULT_CONCURRENCY: usize = 8;

/// Default directory receiving report files.
const DEFAULT_OUTPUT_DIR: &str = "data";

/// Parameters of one report run.
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Trailing window length in days (default: `7`).
    pub window_days: u32,
    /// Coverage below this fraction is flagged (default: `0.95`).
    pub status_threshold: f64,
    /// Budget for the whole per-device batch (default: 60s).
    pub batch_timeout: Duration,
    /// Max per-device queries in flight (default: `8`).
    pub concurrency: usize,
    /// SQL `LIKE` pattern restricting device names.
    pub device_filter: Option<String>,
    /// Directory receiving `<timestamp>.tsv` (default: `data`).
    pub output_dir: PathBuf,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            status_threshold: DEFAULT_STATUS_THRESHOLD,
            batch_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            concurrency: DEFAULT_CONCURRENCY,
            device_filter: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl JobConfig {
    /// Batch budget in whole milliseconds, for logs and errors.
    pub fn batch_timeout_ms(&self) -> u64 {
        u64::try_from(self.batch_timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default |
    /// |---------------------------|---------|
    /// | `REPORT_WINDOW_DAYS`      | `7`     |
    /// | `REPORT_STATUS_THRESHOLD` | `0.95`  |
    /// | `REPORT_TIMEOUT_MS`       | `60000` |
    /// | `REPORT_CONCURRENCY`      | `8`     |
    /// | `REPORT_DEVICE_FILTER`    | --      |
    /// | `REPORT_OUTPUT_DIR`       | `data`  |
    pub fn from_env() -> Result<Self, ReportError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ReportError> {
        let defaults = Self::default();

        let window_days: u32 = parse_or(&lookup, "REPORT_WINDOW_DAYS", defaults.window_days)?;
        if !(1..=MAX_WINDOW_DAYS).contains(&window_days) {
            return Err(ReportError::Config(format!(
                "REPORT_WINDOW_DAYS must be between 1 and {MAX_WINDOW_DAYS}, got {window_days}"
            )));
        }

        let status_threshold: f64 =
            parse_or(&lookup, "REPORT_STATUS_THRESHOLD", defaults.status_threshold)?;
        if !(0.0..=1.0).contains(&status_threshold) {
            return Err(ReportError::Config(format!(
                "REPORT_STATUS_THRESHOLD must be between 0.0 and 1.0, got {status_threshold}"
            )));
        }

        let timeout_ms: u64 = parse_or(&lookup, "REPORT_TIMEOUT_MS", DEFAULT_TIMEOUT_MS)?;
        if timeout_ms == 0 {
            return Err(ReportError::Config(
                "REPORT_TIMEOUT_MS must be at least 1".to_string(),
            ));
        }

        let concurrency: usize = parse_or(&lookup, "REPORT_CONCURRENCY", defaults.concurrency)?;
        if concurrency == 0 {
            return Err(ReportError::Config(
                "REPORT_CONCURRENCY must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            window_days,
            status_threshold,
            batch_timeout: Duration::from_millis(timeout_ms),
            concurrency,
            device_filter: lookup("REPORT_DEVICE_FILTER").filter(|f| !f.trim().is_empty()),
            output_dir: lookup("REPORT_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
        })
    }
}

/// Everything the binary needs: job parameters plus collaborator settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub job: JobConfig,
    pub db: DbConfig,
    /// `None` when mail delivery is not configured.
    pub mail: Option<MailConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ReportError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ReportError> {
        Ok(Self {
            job: JobConfig::from_lookup(&lookup)?,
            db: DbConfig::from_lookup(&lookup)?,
            mail: MailConfig::from_lookup(&lookup)
                .map_err(|e| ReportError::Config(e.to_string()))?,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ReportError> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ReportError::Config(format!("{key} has an invalid value '{raw}'"))),
        None => Ok(default),
    }
}
