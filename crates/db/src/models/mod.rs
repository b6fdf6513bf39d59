//! Row structs decoded from registry and measurement queries.

pub mod device;
pub mod measurement;
