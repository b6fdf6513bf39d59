//! MySQL access for device reports.
//!
//! Two pools are opened: one on the device registry (devices and
//! templates) and one on the measurement store, where every device
//! stream is a table named after its udid. [`MySqlDataSource`] wraps both
//! behind the [`devhealth_core::DataSource`] trait.

use std::time::Duration;

use devhealth_core::ReportError;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};

pub mod models;
pub mod repositories;
pub mod source;

pub use source::MySqlDataSource;

pub type DbPool = sqlx::MySqlPool;

/// Default MySQL port.
const DEFAULT_PORT: u16 = 3306;

/// Connections per pool. Bounds the number of in-flight stats queries.
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// How long to wait for a free connection before failing.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// DbConfig
// ---------------------------------------------------------------------------

/// Connection parameters shared by the registry and measurement databases.
#[derive(Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    /// Registry database (devices, templates).
    pub registry_database: String,
    /// Measurement database (one table per device stream).
    pub measurements_database: String,
    pub max_connections: u32,
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("registry_database", &self.registry_database)
            .field("measurements_database", &self.measurements_database)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl DbConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable                      | Required | Default                   |
    /// |-------------------------------|----------|---------------------------|
    /// | `MYSQL_HOST`                  | no       | `localhost`               |
    /// | `MYSQL_PORT`                  | no       | `3306`                    |
    /// | `MYSQL_USER`                  | no       | `root`                    |
    /// | `MYSQL_PASSWORD`              | no       | --                        |
    /// | `MYSQL_CONCAVA_DATABASE`      | yes      | --                        |
    /// | `MYSQL_MEASUREMENTS_DATABASE` | no       | `MYSQL_CONCAVA_DATABASE`  |
    pub fn from_env() -> Result<Self, ReportError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`DbConfig::from_env`] but reading from an arbitrary source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ReportError> {
        let registry_database = lookup("MYSQL_CONCAVA_DATABASE").ok_or_else(|| {
            ReportError::Config("MYSQL_CONCAVA_DATABASE must be set".to_string())
        })?;

        let port = match lookup("MYSQL_PORT") {
            Some(raw) => raw.parse().map_err(|_| {
                ReportError::Config(format!("MYSQL_PORT must be a valid port, got '{raw}'"))
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            host: lookup("MYSQL_HOST").unwrap_or_else(|| "localhost".to_string()),
            port,
            user: lookup("MYSQL_USER").unwrap_or_else(|| "root".to_string()),
            password: lookup("MYSQL_PASSWORD").filter(|p| !p.is_empty()),
            measurements_database: lookup("MYSQL_MEASUREMENTS_DATABASE")
                .unwrap_or_else(|| registry_database.clone()),
            registry_database,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        })
    }

    fn connect_options(&self, database: &str) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(database);
        match &self.password {
            Some(password) => options.password(password),
            None => options,
        }
    }
}

// ---------------------------------------------------------------------------
// Pools
// ---------------------------------------------------------------------------

/// Open a connection pool on `database`.
pub async fn create_pool(config: &DbConfig, database: &str) -> Result<DbPool, ReportError> {
    MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(config.connect_options(database))
        .await
        .map_err(|e| ReportError::Connection(format!("{database}: {e}")))
}

/// Verify the pool can run a trivial query.
pub async fn health_check(pool: &DbPool) -> Result<(), ReportError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(|e| ReportError::Connection(e.to_string()))
}

/// Map a sqlx error to a report error.
///
/// Transport-level failures mean the database is unreachable; everything
/// else is a query failure, tagged with the device when there is one.
pub fn classify_error(err: sqlx::Error, udid: Option<&str>) -> ReportError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Configuration(_) => ReportError::Connection(err.to_string()),
        other => match udid {
            Some(udid) => ReportError::Query {
                udid: udid.to_string(),
                message: other.to_string(),
            },
            None => ReportError::Registry(other.to_string()),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
