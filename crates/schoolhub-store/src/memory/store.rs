//! In-memory document store using DashMap and tokio broadcast channels.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use futures::StreamExt;
use futures::stream;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;
use uuid::Uuid;

use schoolhub_core::error::AppError;
use schoolhub_core::result::AppResult;
use schoolhub_core::traits::document_store::{DocumentStore, DocumentStream, WriteMode};
use schoolhub_core::types::clock::{Clock, SystemClock};
use schoolhub_core::types::document::{Document, Fields};
use schoolhub_core::types::query::Query;

use super::matcher;

/// Field stamped by `create`.
const CREATED_AT: &str = "createdAt";

/// Buffer size for the change channel.
const CHANGE_BUFFER: usize = 256;

/// Change notifications fanned out to live queries.
#[derive(Debug, Clone)]
enum Change {
    /// A document in the named collection was created or written.
    Collection(String),
    /// The store went up or down.
    Availability,
}

/// In-process document store.
///
/// Cloning is cheap and every clone shares the same data. Live queries are
/// re-evaluated whenever their collection changes, which matches the
/// "push the full result set on any matching change" contract.
#[derive(Debug, Clone)]
pub struct MemoryDocumentStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    /// Collection name → (document id → fields)
    collections: DashMap<String, HashMap<String, Fields>>,
    /// Change fan-out for subscriptions
    changes: broadcast::Sender<Change>,
    /// Source of `createdAt` stamps
    clock: Arc<dyn Clock>,
    /// Last stamp handed out, for strict monotonicity
    last_created_at: Mutex<Option<DateTime<Utc>>>,
    /// When false every operation fails as if the network were down
    available: AtomicBool,
    /// Successful `write` + `create` calls
    writes: AtomicU64,
}

impl MemoryDocumentStore {
    /// Create an empty store stamping with the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store stamping `createdAt` with `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            inner: Arc::new(Inner {
                collections: DashMap::new(),
                changes,
                clock,
                last_created_at: Mutex::new(None),
                available: AtomicBool::new(true),
                writes: AtomicU64::new(0),
            }),
        }
    }

    /// Simulate the backend becoming unreachable (`false`) or recovering
    /// (`true`). Live queries are notified either way.
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
        let _ = self.inner.changes.send(Change::Availability);
    }

    /// Number of successful writes and creates so far.
    pub fn write_count(&self) -> u64 {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.inner
            .collections
            .get(collection)
            .map(|c| c.len())
            .unwrap_or(0)
    }

    /// Whether a collection is empty or absent.
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn ensure_available(&self) -> AppResult<()> {
        if self.inner.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::service_unavailable("Document store is unreachable"))
        }
    }

    fn snapshot(&self, query: &Query) -> AppResult<Vec<Document>> {
        self.ensure_available()?;
        Ok(self
            .inner
            .collections
            .get(&query.collection)
            .map(|docs| matcher::evaluate(query, &docs))
            .unwrap_or_default())
    }

    fn notify(&self, collection: &str) {
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        // No receivers is fine; nobody is listening yet.
        let _ = self
            .inner
            .changes
            .send(Change::Collection(collection.to_string()));
    }

    /// Next `createdAt` stamp: the clock's reading, bumped by a microsecond
    /// when it would not be strictly after the previous stamp.
    fn next_created_at(&self) -> DateTime<Utc> {
        let now = self.inner.clock.now();
        let mut last = self
            .inner
            .last_created_at
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let stamp = match *last {
            Some(prev) if now <= prev => prev + Duration::microseconds(1),
            _ => now,
        };
        *last = Some(stamp);
        stamp
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn read(&self, query: &Query) -> AppResult<Vec<Document>> {
        self.snapshot(query)
    }

    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Document>> {
        self.ensure_available()?;
        Ok(self.inner.collections.get(collection).and_then(|docs| {
            docs.get(id)
                .map(|fields| Document::new(id.to_string(), fields.clone()))
        }))
    }

    async fn subscribe(&self, query: Query) -> AppResult<DocumentStream> {
        // Subscribe before the initial snapshot so no change can slip in
        // between the two.
        let rx = self.inner.changes.subscribe();
        let initial = self.snapshot(&query)?;

        let updates = stream::unfold(
            (rx, self.clone(), query),
            |(mut rx, store, query)| async move {
                loop {
                    match rx.recv().await {
                        Ok(Change::Collection(name)) if name != query.collection => continue,
                        Ok(_) => {
                            let item = store.snapshot(&query);
                            return Some((item, (rx, store, query)));
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(
                                collection = %query.collection,
                                skipped, "Live query lagged, re-evaluating"
                            );
                            let item = store.snapshot(&query);
                            return Some((item, (rx, store, query)));
                        }
                        Err(RecvError::Closed) => return None,
                    }
                }
            },
        );

        Ok(stream::iter([Ok(initial)]).chain(updates).boxed())
    }

    async fn write(
        &self,
        collection: &str,
        id: &str,
        patch: Fields,
        mode: WriteMode,
    ) -> AppResult<()> {
        self.ensure_available()?;
        {
            let mut docs = self
                .inner
                .collections
                .entry(collection.to_string())
                .or_default();
            match mode {
                WriteMode::Merge => {
                    docs.entry(id.to_string()).or_default().extend(patch);
                }
                WriteMode::Replace => {
                    docs.insert(id.to_string(), patch);
                }
            }
        }
        self.notify(collection);
        Ok(())
    }

    async fn create(&self, collection: &str, mut fields: Fields) -> AppResult<String> {
        self.ensure_available()?;
        let id = Uuid::new_v4().to_string();
        let stamp = serde_json::to_value(self.next_created_at())?;
        fields.insert(CREATED_AT.to_string(), stamp);
        self.inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        self.notify(collection);
        Ok(id)
    }
}
