//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&MySqlPool` as the first argument.

pub mod device_repo;
pub mod measurement_repo;

pub use device_repo::DeviceRepo;
pub use measurement_repo::{MeasurementRepo, StreamTable};
