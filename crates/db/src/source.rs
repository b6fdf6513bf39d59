//! [`DataSource`] backed by the registry and measurement MySQL databases.

use async_trait::async_trait;
use devhealth_core::{DataSource, Device, ReportError, Timestamp, WindowStats};

use crate::repositories::{DeviceRepo, MeasurementRepo, StreamTable};
use crate::{classify_error, create_pool, health_check, DbConfig, DbPool};

/// Explicit handle on both databases, passed to whoever runs queries.
#[derive(Debug, Clone)]
pub struct MySqlDataSource {
    registry: DbPool,
    measurements: DbPool,
}

impl MySqlDataSource {
    pub fn new(registry: DbPool, measurements: DbPool) -> Self {
        Self {
            registry,
            measurements,
        }
    }

    /// Open and health-check both pools.
    pub async fn connect(config: &DbConfig) -> Result<Self, ReportError> {
        let registry = create_pool(config, &config.registry_database).await?;
        health_check(&registry).await?;
        tracing::info!(database = %config.registry_database, "Registry pool ready");

        let measurements = create_pool(config, &config.measurements_database).await?;
        health_check(&measurements).await?;
        tracing::info!(database = %config.measurements_database, "Measurement pool ready");

        Ok(Self::new(registry, measurements))
    }

    /// Close both pools, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.registry.close().await;
        self.measurements.close().await;
    }
}

#[async_trait]
impl DataSource for MySqlDataSource {
    async fn list_devices(&self, filter: Option<&str>) -> Result<Vec<Device>, ReportError> {
        let rows = DeviceRepo::list(&self.registry, filter)
            .await
            .map_err(|e| classify_error(e, None))?;
        Ok(rows.into_iter().map(Device::from).collect())
    }

    async fn window_stats(
        &self,
        udid: &str,
        window_start: Timestamp,
        now: Timestamp,
    ) -> Result<WindowStats, ReportError> {
        let table = StreamTable::for_udid(udid).ok_or_else(|| ReportError::Query {
            udid: udid.to_string(),
            message: "udid is not a valid measurement table name".to_string(),
        })?;

        MeasurementRepo::window_stats(&self.measurements, &table, window_start, now)
            .await
            .map_err(|e| classify_error(e, Some(udid)))
    }
}
