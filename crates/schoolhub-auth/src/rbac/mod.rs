//! Role-based visibility rules.

pub mod resolver;

pub use resolver::RoleResolver;
