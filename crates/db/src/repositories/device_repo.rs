//! Repository for the registry `devices` and `templates` tables.

use sqlx::MySqlPool;

use crate::models::device::DeviceRow;

/// Column list for device listing queries.
const COLUMNS: &str = "\
    d.name AS device_name, d.udid, t.name AS template_name";

/// Provides query operations for registry devices.
pub struct DeviceRepo;

impl DeviceRepo {
    /// List devices with their template, ordered by device name.
    ///
    /// `name_pattern` is a SQL `LIKE` pattern; `None` lists every device.
    pub async fn list(
        pool: &MySqlPool,
        name_pattern: Option<&str>,
    ) -> Result<Vec<DeviceRow>, sqlx::Error> {
        let query = Self::list_query(name_pattern.is_some());
        let mut q = sqlx::query_as::<_, DeviceRow>(&query);
        if let Some(pattern) = name_pattern {
            q = q.bind(pattern);
        }
        q.fetch_all(pool).await
    }

    fn list_query(filtered: bool) -> String {
        let filter = if filtered { "WHERE d.name LIKE ? " } else { "" };
        format!(
            "SELECT {COLUMNS} FROM devices d \
             INNER JOIN templates t ON t.id = d.template_id \
             {filter}\
             ORDER BY d.name ASC"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfiltered_query_has_no_where_clause() {
        let query = DeviceRepo::list_query(false);
        assert!(!query.contains("WHERE"));
        assert!(query.ends_with("ORDER BY d.name ASC"));
    }

    #[test]
    fn filtered_query_binds_name_pattern() {
        let query = DeviceRepo::list_query(true);
        assert!(query.contains("WHERE d.name LIKE ? ORDER BY d.name ASC"));
        assert!(query.contains("INNER JOIN templates t ON t.id = d.template_id"));
    }
}
