//! Principal profiles.

pub mod directory;

pub use directory::PrincipalDirectory;
