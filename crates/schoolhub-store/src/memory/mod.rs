//! In-memory document store.

pub mod matcher;
pub mod store;

pub use store::MemoryDocumentStore;
