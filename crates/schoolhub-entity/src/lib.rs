//! # schoolhub-entity
//!
//! Domain entity models for the SchoolHub presence engine. Every struct in
//! this crate is either a stored document shape or a value object. Stored
//! shapes use camelCase field names, matching the external document
//! database, and expose their collection name as `COLLECTION`.

pub mod notification;
pub mod presence;
pub mod principal;
pub mod session;
