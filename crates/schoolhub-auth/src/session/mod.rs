//! Connection audit sessions.

pub mod fingerprint;
pub mod recorder;

pub use fingerprint::DeviceFingerprint;
pub use recorder::SessionRecorder;
