//! # schoolhub-core
//!
//! Core crate for the SchoolHub presence engine. Contains configuration
//! schemas, typed identifiers, the clock abstraction, document/query types,
//! the [`DocumentStore`](traits::DocumentStore) trait, and the unified
//! error system.
//!
//! This crate has **no** internal dependencies on other SchoolHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
