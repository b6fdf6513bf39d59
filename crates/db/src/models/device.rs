//! Registry device rows.

use devhealth_core::Device;
use sqlx::FromRow;

/// A device joined with its template, as listed by the registry.
#[derive(Debug, Clone, FromRow)]
pub struct DeviceRow {
    pub device_name: String,
    pub udid: String,
    pub template_name: String,
}

impl From<DeviceRow> for Device {
    fn from(row: DeviceRow) -> Self {
        Device {
            name: row.device_name,
            udid: row.udid,
            template_name: row.template_name,
        }
    }
}
