/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// A device as listed by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub name: String,
    /// Unique identifier, also the key of the device's measurement stream.
    pub udid: String,
    pub template_name: String,
}

impl Device {
    pub fn new(
        name: impl Into<String>,
        udid: impl Into<String>,
        template_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            udid: udid.into(),
            template_name: template_name.into(),
        }
    }
}
