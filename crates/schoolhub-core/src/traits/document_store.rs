//! Real-time document store trait.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::result::AppResult;
use crate::types::document::{Document, Fields};
use crate::types::query::Query;

/// A live query result stream. Each item is the full, current result set
/// of the query; the stream pushes a new item whenever a matching
/// collection changes. An `Err` item reports a transport failure without
/// ending the stream.
pub type DocumentStream = BoxStream<'static, AppResult<Vec<Document>>>;

/// How `write` combines the patch with an existing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Upsert: create the document if absent, otherwise overwrite only the
    /// fields present in the patch.
    Merge,
    /// Replace the whole document.
    Replace,
}

/// Trait for the external document database the engine reads from and
/// writes to.
///
/// Implementations must assign a strictly increasing `createdAt` on
/// [`create`](DocumentStore::create) so it can serve as a watermark.
#[async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug + 'static {
    /// Run a one-shot query.
    async fn read(&self, query: &Query) -> AppResult<Vec<Document>>;

    /// Fetch one document by id.
    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Document>>;

    /// Subscribe to a live query. The first item is the current result set.
    async fn subscribe(&self, query: Query) -> AppResult<DocumentStream>;

    /// Write a document under a caller-chosen id.
    async fn write(&self, collection: &str, id: &str, patch: Fields, mode: WriteMode)
    -> AppResult<()>;

    /// Create a document under a store-assigned id, stamping `createdAt`.
    /// Returns the new id.
    async fn create(&self, collection: &str, fields: Fields) -> AppResult<String>;
}
