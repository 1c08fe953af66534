//! Presence tracker: heartbeat writes and role-gated roster reads.

use std::sync::Arc;

use futures::StreamExt;
use futures::stream::{self, BoxStream};
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use schoolhub_auth::rbac::RoleResolver;
use schoolhub_core::config::PresenceConfig;
use schoolhub_core::result::AppResult;
use schoolhub_core::traits::document_store::{DocumentStore, WriteMode};
use schoolhub_core::types::clock::Clock;
use schoolhub_core::types::document::{Document, encode_fields};
use schoolhub_core::types::query::Query;
use schoolhub_entity::presence::PresenceSample;
use schoolhub_entity::principal::Principal;

use super::heartbeat::HeartbeatHandle;
use super::roster::Roster;

/// Live roster updates.
pub type RosterStream = BoxStream<'static, Roster>;

/// Writes the signed-in principal's heartbeat and serves rosters to
/// viewers allowed to see them.
#[derive(Clone)]
pub struct PresenceTracker {
    /// Backing document store.
    store: Arc<dyn DocumentStore>,
    /// Time source for `lastSeenAt` and online checks.
    clock: Arc<dyn Clock>,
    /// Heartbeat interval and online window.
    config: PresenceConfig,
    /// Visibility rules and role normalization.
    resolver: RoleResolver,
}

impl std::fmt::Debug for PresenceTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceTracker")
            .field("config", &self.config)
            .finish()
    }
}

impl PresenceTracker {
    /// Create a new presence tracker
    pub fn new(
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        config: PresenceConfig,
        resolver: RoleResolver,
    ) -> Self {
        Self {
            store,
            clock,
            config,
            resolver,
        }
    }

    /// The online window rosters are computed with.
    pub fn online_window(&self) -> chrono::Duration {
        self.config.online_window()
    }

    /// Upsert the principal's presence sample with `lastSeenAt = now`.
    pub async fn beat(&self, principal: &Principal) -> AppResult<()> {
        let mut sample = PresenceSample::beat(principal, self.clock.now());
        sample.role = self.resolver.normalize_role(sample.role);
        self.store
            .write(
                PresenceSample::COLLECTION,
                &principal.id.to_doc_id(),
                encode_fields(&sample)?,
                WriteMode::Merge,
            )
            .await
    }

    /// Start heartbeating for `principal`: one beat immediately, then one
    /// per interval until `cancel` fires or the handle is stopped.
    ///
    /// Failed beats are logged and skipped; the next tick tries again.
    pub fn start_heartbeat(&self, principal: Principal, cancel: CancellationToken) -> HeartbeatHandle {
        let tracker = self.clone();
        let token = cancel.clone();
        let period = self.config.heartbeat_interval();

        let task = tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        if let Err(e) = tracker.beat(&principal).await {
                            warn!(principal_id = %principal.id, error = %e, "Heartbeat write failed");
                        }
                    }
                }
            }

            debug!(principal_id = %principal.id, "Heartbeat loop ended");
        });

        HeartbeatHandle::new(cancel, task)
    }

    /// One-shot roster for `viewer`'s tenant.
    ///
    /// Viewers without presence visibility get an empty roster and the
    /// store is not queried. Read failures also yield an empty roster.
    pub async fn read_roster(&self, viewer: &Principal) -> Roster {
        let window = self.online_window();
        if !self.resolver.can_view_presence(&viewer.role) {
            return Roster::empty(window);
        }

        match self.store.read(&roster_query(viewer)).await {
            Ok(docs) => build_roster(&self.resolver, &docs, window),
            Err(e) => {
                warn!(viewer_id = %viewer.id, error = %e, "Roster read failed");
                Roster::empty(window)
            }
        }
    }

    /// Live roster for `viewer`'s tenant. Same visibility and failure rules
    /// as [`read_roster`](Self::read_roster); a denied viewer gets a single
    /// empty roster.
    pub async fn subscribe_roster(&self, viewer: &Principal) -> RosterStream {
        let window = self.online_window();
        if !self.resolver.can_view_presence(&viewer.role) {
            return stream::iter([Roster::empty(window)]).boxed();
        }

        let live = match self.store.subscribe(roster_query(viewer)).await {
            Ok(live) => live,
            Err(e) => {
                warn!(viewer_id = %viewer.id, error = %e, "Roster subscription failed");
                return stream::iter([Roster::empty(window)]).boxed();
            }
        };

        let resolver = self.resolver.clone();
        live.map(move |item| match item {
            Ok(docs) => build_roster(&resolver, &docs, window),
            Err(e) => {
                debug!(error = %e, "Roster stream error, showing no data");
                Roster::empty(window)
            }
        })
        .boxed()
    }
}

fn roster_query(viewer: &Principal) -> Query {
    Query::collection(PresenceSample::COLLECTION).where_eq("tenantId", viewer.tenant_id)
}

fn build_roster(resolver: &RoleResolver, docs: &[Document], window: chrono::Duration) -> Roster {
    let samples = docs
        .iter()
        .filter_map(|doc| match doc.decode::<PresenceSample>() {
            Ok(mut sample) => {
                sample.role = resolver.normalize_role(sample.role);
                Some(sample)
            }
            Err(e) => {
                warn!(error = %e, "Skipping malformed presence sample");
                None
            }
        })
        .collect();
    Roster::new(samples, window)
}
