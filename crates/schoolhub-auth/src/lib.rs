//! # schoolhub-auth
//!
//! Identity-side building blocks of the SchoolHub presence engine.
//!
//! ## Modules
//!
//! - `rbac` — Role normalization and visibility predicates
//! - `session` — Device fingerprinting and the connection audit log
//! - `principal` — Profile lookup, auto-provisioning, and profile edits

pub mod principal;
pub mod rbac;
pub mod session;

pub use principal::PrincipalDirectory;
pub use rbac::RoleResolver;
pub use session::{DeviceFingerprint, SessionRecorder};
