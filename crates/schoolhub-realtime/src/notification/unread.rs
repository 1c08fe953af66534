//! Persisted inbox with an unread counter and optimistic mark-read.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use futures::StreamExt;
use futures::stream;
use serde_json::Value;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use schoolhub_core::config::NotificationConfig;
use schoolhub_core::result::AppResult;
use schoolhub_core::traits::document_store::{DocumentStore, DocumentStream, WriteMode};
use schoolhub_core::types::clock::Clock;
use schoolhub_core::types::document::{Document, Fields};
use schoolhub_core::types::id::NotificationId;
use schoolhub_core::types::query::Query;
use schoolhub_entity::notification::{PersistedNotification, ReadStatus};
use schoolhub_entity::principal::Principal;

/// How many notifications the inbox loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListView {
    /// Dropdown-sized list.
    #[default]
    Compact,
    /// Full inbox page.
    Full,
}

impl ListView {
    /// Result cap for this view.
    pub fn limit(&self, config: &NotificationConfig) -> usize {
        match self {
            Self::Compact => config.compact_limit,
            Self::Full => config.full_limit,
        }
    }
}

/// Loaded inbox window and its derived unread count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnreadSnapshot {
    /// Newest first.
    pub items: Vec<PersistedNotification>,
    /// Number of `items` still unread.
    pub unread_count: usize,
}

impl UnreadSnapshot {
    fn new(items: Vec<PersistedNotification>) -> Self {
        let unread_count = items.iter().filter(|n| n.is_unread()).count();
        Self {
            items,
            unread_count,
        }
    }

    /// Ids of unread items.
    pub fn unread_ids(&self) -> Vec<NotificationId> {
        self.items
            .iter()
            .filter(|n| n.is_unread())
            .map(|n| n.id)
            .collect()
    }
}

#[derive(Debug, Default)]
struct InboxState {
    items: Vec<PersistedNotification>,
    /// Ids with a remote mark-read in flight.
    pending: HashSet<NotificationId>,
    /// Ids whose remote mark-read landed, with the generation it landed at.
    /// Kept until a snapshot read after that point arrives.
    settled: HashMap<NotificationId, u64>,
    /// Bumped every time a remote mark-read lands.
    generation: u64,
}

struct Inner {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    recipient: Principal,
    query: Query,
    poll_interval: std::time::Duration,
    state: Mutex<InboxState>,
    tx: watch::Sender<UnreadSnapshot>,
}

/// The signed-in principal's notification inbox.
///
/// Cloning is cheap and clones share state, so one clone can run the
/// update loop while others serve reads and mark-read calls.
#[derive(Clone)]
pub struct UnreadNotificationStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for UnreadNotificationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnreadNotificationStore")
            .field("recipient_id", &self.inner.recipient.id)
            .finish()
    }
}

impl UnreadNotificationStore {
    /// Create an empty inbox for `recipient`.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        recipient: Principal,
        config: &NotificationConfig,
        view: ListView,
    ) -> Self {
        let query = Query::collection(PersistedNotification::COLLECTION)
            .where_eq("recipientId", recipient.id)
            .where_eq("tenantId", recipient.tenant_id)
            .order_desc("createdAt")
            .limit(view.limit(config));
        let (tx, _) = watch::channel(UnreadSnapshot::default());

        Self {
            inner: Arc::new(Inner {
                store,
                clock,
                recipient,
                query,
                poll_interval: config.poll_interval(),
                state: Mutex::new(InboxState::default()),
                tx,
            }),
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> UnreadSnapshot {
        self.inner.tx.borrow().clone()
    }

    /// Receiver notified on every snapshot change.
    pub fn subscribe(&self) -> watch::Receiver<UnreadSnapshot> {
        self.inner.tx.subscribe()
    }

    /// Reload the inbox window. On failure the loaded items are kept and
    /// the current snapshot is returned.
    pub async fn refresh(&self) -> UnreadSnapshot {
        let observed = self.lock().generation;
        match self.inner.store.read(&self.inner.query).await {
            Ok(docs) => self.apply_observed(&docs, observed),
            Err(e) => {
                warn!(
                    recipient_id = %self.inner.recipient.id,
                    error = %e,
                    "Notification poll failed, keeping loaded items"
                );
                self.snapshot()
            }
        }
    }

    /// Replace the loaded window with `docs`, a result set read just now.
    pub fn apply(&self, docs: &[Document]) -> UnreadSnapshot {
        let observed = self.lock().generation;
        self.apply_observed(docs, observed)
    }

    /// Replace the loaded window with `docs`, read when the settle
    /// generation was `observed`.
    ///
    /// Items with a mark-read in flight, or one that landed after the read
    /// started, keep their local read state so a stale snapshot cannot
    /// resurrect them.
    fn apply_observed(&self, docs: &[Document], observed: u64) -> UnreadSnapshot {
        let mut incoming = decode_notifications(docs);
        let mut state = self.lock();
        state.settled.retain(|_, landed| *landed > observed);

        for item in incoming.iter_mut().filter(|n| {
            state.pending.contains(&n.id) || state.settled.contains_key(&n.id)
        }) {
            let local_read_at = state
                .items
                .iter()
                .find(|local| local.id == item.id)
                .and_then(|local| local.read_at);
            if item.is_unread() {
                item.mark_read(local_read_at.unwrap_or_else(|| self.inner.clock.now()));
            }
        }

        state.items = incoming;
        self.publish(&state)
    }

    /// Mark one notification read: locally at once, then remotely.
    ///
    /// Returns false, with no remote write, when the id is not an unread
    /// item of the loaded window. Remote failures are logged and otherwise
    /// ignored; the next poll shows the server's state.
    pub async fn mark_read(&self, id: NotificationId) -> bool {
        let now = self.inner.clock.now();
        {
            let mut state = self.lock();
            let transitioned = state
                .items
                .iter_mut()
                .find(|n| n.id == id)
                .is_some_and(|n| n.mark_read(now));
            if !transitioned {
                return false;
            }
            state.pending.insert(id);
            self.publish(&state);
        }

        let result = self.write_read(id, now).await;

        let mut state = self.lock();
        state.pending.remove(&id);
        match result {
            Ok(()) => {
                state.generation += 1;
                let landed = state.generation;
                state.settled.insert(id, landed);
            }
            Err(e) => {
                warn!(notification_id = %id, error = %e, "Remote mark-read failed");
            }
        }
        true
    }

    /// Mark every notification that is unread right now. Items that arrive
    /// while this runs are left untouched.
    pub async fn mark_all_read(&self) -> usize {
        let targets = self.snapshot().unread_ids();
        let mut marked = 0;
        for id in targets {
            if self.mark_read(id).await {
                marked += 1;
            }
        }
        debug!(recipient_id = %self.inner.recipient.id, marked, "Marked all notifications read");
        marked
    }

    /// Keep the inbox current until `cancel` fires: push updates from a
    /// live query plus a periodic poll.
    pub async fn run(self, cancel: CancellationToken) {
        let mut live: DocumentStream = match self.inner.store.subscribe(self.inner.query.clone()).await {
            Ok(live) => live,
            Err(e) => {
                warn!(error = %e, "Notification subscription failed, polling only");
                stream::pending().boxed()
            }
        };

        let mut poll = time::interval(self.inner.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                item = live.next() => match item {
                    Some(Ok(docs)) => {
                        self.apply(&docs);
                    }
                    Some(Err(e)) => {
                        debug!(error = %e, "Notification stream error, clearing inbox");
                        self.clear();
                    }
                    None => {
                        warn!("Notification subscription ended, polling only");
                        live = stream::pending().boxed();
                    }
                },
                _ = poll.tick() => {
                    let snapshot = self.refresh().await;
                    debug!(unread = snapshot.unread_count, "Notification poll");
                }
            }
        }

        info!(recipient_id = %self.inner.recipient.id, "Notification loop ended");
    }

    fn clear(&self) {
        let mut state = self.lock();
        state.items.clear();
        self.publish(&state);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InboxState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, state: &InboxState) -> UnreadSnapshot {
        let snapshot = UnreadSnapshot::new(state.items.clone());
        self.inner.tx.send_replace(snapshot.clone());
        snapshot
    }

    async fn write_read(&self, id: NotificationId, at: DateTime<Utc>) -> AppResult<()> {
        let mut patch = Fields::new();
        patch.insert(
            "status".to_string(),
            Value::String(ReadStatus::Read.as_str().to_string()),
        );
        patch.insert("readAt".to_string(), serde_json::to_value(at)?);
        self.inner
            .store
            .write(
                PersistedNotification::COLLECTION,
                &id.to_doc_id(),
                patch,
                WriteMode::Merge,
            )
            .await
    }
}

fn decode_notifications(docs: &[Document]) -> Vec<PersistedNotification> {
    docs.iter()
        .filter_map(|doc| match doc.decode::<PersistedNotification>() {
            Ok(n) => Some(n),
            Err(e) => {
                warn!(error = %e, "Skipping malformed notification");
                None
            }
        })
        .collect()
}
