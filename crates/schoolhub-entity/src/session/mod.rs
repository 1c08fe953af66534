//! Session audit records and their device metadata.

pub mod device;
pub mod model;

pub use device::{DeviceInfo, DeviceKind, GeoInfo};
pub use model::{NewSession, Session};
