//! Live toast feed.
//!
//! The backing store delivers the most recent feed events on every change,
//! newest first and with no delivery guarantee. [`FeedState`] turns that
//! recency window into "show each new, relevant event once" using a
//! watermark captured at session start plus a set of already-handled ids.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use futures::StreamExt;
use futures::stream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use schoolhub_auth::rbac::RoleResolver;
use schoolhub_core::config::FeedConfig;
use schoolhub_core::traits::document_store::{DocumentStore, DocumentStream};
use schoolhub_core::types::clock::Clock;
use schoolhub_core::types::document::Document;
use schoolhub_core::types::id::EventId;
use schoolhub_core::types::query::Query;
use schoolhub_entity::notification::NotificationEvent;
use schoolhub_entity::principal::Principal;

use super::toast::{Toast, ToastPhase};

/// Per-session feed state machine.
#[derive(Debug)]
pub struct FeedState {
    /// Viewer, with a canonical role.
    principal: Principal,
    /// Events created at or before this instant are history.
    watermark: DateTime<Utc>,
    /// Events already handled, shown or not.
    seen: HashSet<EventId>,
    /// Display queue, newest first.
    queue: VecDeque<Toast>,
    config: FeedConfig,
    resolver: RoleResolver,
}

impl FeedState {
    /// Arm a fresh state for `principal` at session start.
    pub fn armed(
        principal: Principal,
        now: DateTime<Utc>,
        config: FeedConfig,
        resolver: RoleResolver,
    ) -> Self {
        let principal = resolver.normalize_principal(principal);
        Self {
            principal,
            watermark: now,
            seen: HashSet::new(),
            queue: VecDeque::new(),
            config,
            resolver,
        }
    }

    /// The instant captured when the state was armed.
    pub fn watermark(&self) -> DateTime<Utc> {
        self.watermark
    }

    /// Whether an event id has been handled.
    pub fn has_seen(&self, id: EventId) -> bool {
        self.seen.contains(&id)
    }

    /// Run a delivered batch through the filters and enqueue what survives.
    ///
    /// Returns the toasts surfaced by this batch, newest first.
    pub fn ingest(&mut self, batch: &[NotificationEvent], now: DateTime<Utc>) -> Vec<Toast> {
        let mut ordered: Vec<&NotificationEvent> = batch.iter().collect();
        ordered.sort_by_key(|event| event.created_at);

        let mut surfaced = Vec::new();
        for event in ordered {
            if event.author_id == self.principal.id {
                continue;
            }
            if self.seen.contains(&event.id) {
                continue;
            }
            self.seen.insert(event.id);
            if event.created_at <= self.watermark {
                continue;
            }
            if !self.resolver.audience_includes(&event.audience, &self.principal) {
                continue;
            }

            let toast = Toast::new(
                event.clone(),
                now,
                self.config.display(),
                self.config.exit(),
            );
            self.queue.push_front(toast.clone());
            surfaced.push(toast);
        }

        while self.queue.len() > self.config.queue_capacity {
            self.queue.pop_back();
        }

        surfaced.reverse();
        surfaced
    }

    /// Start the exit animation of a visible toast.
    pub fn dismiss(&mut self, id: EventId, now: DateTime<Utc>) -> bool {
        let exit = self.config.exit();
        self.queue
            .iter_mut()
            .find(|toast| toast.id() == id)
            .is_some_and(|toast| toast.dismiss(now, exit))
    }

    /// Drop toasts that are gone. Returns whether anything was removed.
    pub fn prune(&mut self, now: DateTime<Utc>) -> bool {
        let before = self.queue.len();
        self.queue
            .retain(|toast| toast.phase(now) != ToastPhase::Gone);
        self.queue.len() != before
    }

    /// Current display queue, newest first.
    pub fn toasts(&self) -> Vec<Toast> {
        self.queue.iter().cloned().collect()
    }
}

/// Spawns per-session feed loops.
#[derive(Clone)]
pub struct NotificationFeed {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    config: FeedConfig,
    resolver: RoleResolver,
}

impl std::fmt::Debug for NotificationFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationFeed")
            .field("config", &self.config)
            .finish()
    }
}

impl NotificationFeed {
    /// Creates a new feed spawner.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        config: FeedConfig,
        resolver: RoleResolver,
    ) -> Self {
        Self {
            store,
            clock,
            config,
            resolver,
        }
    }

    /// The live query for `principal`'s tenant feed.
    pub fn query(&self, principal: &Principal) -> Query {
        Query::collection(NotificationEvent::COLLECTION)
            .where_eq("tenantId", principal.tenant_id)
            .order_desc("createdAt")
            .limit(self.config.recent_window)
    }

    /// Arm a feed for `principal` now and start its loop.
    pub fn spawn(&self, principal: Principal, cancel: CancellationToken) -> FeedHandle {
        let query = self.query(&principal);
        let state = FeedState::armed(
            principal,
            self.clock.now(),
            self.config.clone(),
            self.resolver.clone(),
        );
        let (tx, rx) = watch::channel(Vec::new());
        let shared = Arc::new(FeedShared {
            state: Mutex::new(state),
            tx,
            clock: self.clock.clone(),
        });

        let task = tokio::spawn(run_feed(
            shared.clone(),
            self.store.clone(),
            query,
            self.config.clone(),
            cancel.clone(),
        ));

        FeedHandle {
            shared,
            rx,
            cancel,
            task: Some(task),
        }
    }
}

#[derive(Debug)]
struct FeedShared {
    state: Mutex<FeedState>,
    tx: watch::Sender<Vec<Toast>>,
    clock: Arc<dyn Clock>,
}

impl FeedShared {
    fn with_state<R>(&self, f: impl FnOnce(&mut FeedState, DateTime<Utc>) -> (R, bool)) -> R {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let (result, changed) = f(&mut state, self.clock.now());
        if changed {
            self.tx.send_replace(state.toasts());
        }
        result
    }
}

async fn run_feed(
    shared: Arc<FeedShared>,
    store: Arc<dyn DocumentStore>,
    query: Query,
    config: FeedConfig,
    cancel: CancellationToken,
) {
    let mut live: DocumentStream = match store.subscribe(query).await {
        Ok(live) => live,
        Err(e) => {
            warn!(error = %e, "Feed subscription failed, no toasts this session");
            stream::pending().boxed()
        }
    };

    let mut prune = time::interval(config.prune_interval());
    prune.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            item = live.next() => match item {
                Some(Ok(docs)) => {
                    let events = decode_events(&docs);
                    let surfaced = shared.with_state(|state, now| {
                        let surfaced = state.ingest(&events, now);
                        let changed = !surfaced.is_empty();
                        (surfaced, changed)
                    });
                    for toast in &surfaced {
                        info!(
                            event_id = %toast.id(),
                            author_id = %toast.event.author_id,
                            audience = %toast.event.audience,
                            "Toast surfaced"
                        );
                    }
                }
                Some(Err(e)) => {
                    debug!(error = %e, "Feed unavailable, waiting for recovery");
                }
                None => {
                    warn!("Feed subscription ended");
                    live = stream::pending().boxed();
                }
            },
            _ = prune.tick() => {
                shared.with_state(|state, now| ((), state.prune(now)));
            }
        }
    }

    debug!("Feed loop ended");
}

fn decode_events(docs: &[Document]) -> Vec<NotificationEvent> {
    docs.iter()
        .filter_map(|doc| match doc.decode::<NotificationEvent>() {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(error = %e, "Skipping malformed feed event");
                None
            }
        })
        .collect()
}

/// A running feed for one session.
#[derive(Debug)]
pub struct FeedHandle {
    shared: Arc<FeedShared>,
    rx: watch::Receiver<Vec<Toast>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl FeedHandle {
    /// Current toasts, newest first.
    pub fn toasts(&self) -> Vec<Toast> {
        self.rx.borrow().clone()
    }

    /// Receiver notified whenever the toast list changes.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Toast>> {
        self.rx.clone()
    }

    /// Dismiss a toast. Returns false if it is unknown or already leaving.
    pub fn dismiss(&self, id: EventId) -> bool {
        self.shared.with_state(|state, now| {
            let dismissed = state.dismiss(id, now);
            (dismissed, dismissed)
        })
    }

    /// Whether the feed has handled an event id.
    pub fn has_seen(&self, id: EventId) -> bool {
        self.shared.with_state(|state, _| (state.has_seen(id), false))
    }

    /// Stop the loop and wait for it to exit.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                debug!(error = %e, "Feed task ended abnormally");
            }
        }
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
