//! `devhealth-report` library crate.
//!
//! Re-exports the orchestration modules for integration testing. The
//! binary entrypoint lives in `main.rs`.

pub mod config;
pub mod job;
pub mod sink;

pub use config::{AppConfig, JobConfig};
pub use job::{output_path, MailOutcome, ReportJob, RunOutcome};
pub use sink::FileReportSink;
