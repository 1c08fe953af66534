//! Principal identities and roles.

pub mod model;
pub mod role;

pub use model::{AuthIdentity, Principal};
pub use role::Role;
