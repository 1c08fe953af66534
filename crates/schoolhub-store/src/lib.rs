//! # schoolhub-store
//!
//! Document store implementations for the presence engine. The engine only
//! talks to the [`DocumentStore`](schoolhub_core::traits::DocumentStore)
//! trait; this crate provides the in-process implementation used by the
//! engine binary and the test suites.

pub mod memory;

pub use memory::MemoryDocumentStore;
