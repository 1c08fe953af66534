//! Sign-in and sign-out orchestration.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use schoolhub_auth::principal::PrincipalDirectory;
use schoolhub_auth::rbac::RoleResolver;
use schoolhub_auth::session::{DeviceFingerprint, SessionRecorder};
use schoolhub_core::config::AppConfig;
use schoolhub_core::error::AppError;
use schoolhub_core::result::AppResult;
use schoolhub_core::traits::document_store::DocumentStore;
use schoolhub_core::types::clock::Clock;
use schoolhub_core::types::id::{EventId, SessionId};
use schoolhub_entity::principal::Principal;
use schoolhub_entity::session::{GeoInfo, Session};

use crate::notification::feed::{FeedHandle, NotificationFeed};
use crate::notification::toast::Toast;
use crate::notification::unread::{ListView, UnreadNotificationStore};
use crate::presence::heartbeat::HeartbeatHandle;
use crate::presence::roster::Roster;
use crate::presence::tracker::{PresenceTracker, RosterStream};

/// What the client told us about itself at sign-in.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    /// Raw user-agent header.
    pub user_agent: Option<String>,
    /// Best-effort location.
    pub geo: Option<GeoInfo>,
}

/// Shared services for every session in the process.
#[derive(Clone)]
pub struct PresenceEngine {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    config: AppConfig,
    resolver: RoleResolver,
    recorder: Arc<SessionRecorder>,
    tracker: PresenceTracker,
    feed: NotificationFeed,
    directory: Arc<PrincipalDirectory>,
}

impl std::fmt::Debug for PresenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceEngine").finish()
    }
}

impl PresenceEngine {
    /// Creates a new engine over `store`.
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>, config: AppConfig) -> Self {
        let resolver = RoleResolver::new(&config.roles);
        let recorder = Arc::new(SessionRecorder::new(
            store.clone(),
            clock.clone(),
            resolver.clone(),
        ));
        let tracker = PresenceTracker::new(
            store.clone(),
            clock.clone(),
            config.presence.clone(),
            resolver.clone(),
        );
        let feed = NotificationFeed::new(
            store.clone(),
            clock.clone(),
            config.feed.clone(),
            resolver.clone(),
        );
        let directory = Arc::new(PrincipalDirectory::new(store.clone(), resolver.clone()));

        info!("Presence engine initialized");

        Self {
            store,
            clock,
            config,
            resolver,
            recorder,
            tracker,
            feed,
            directory,
        }
    }

    /// Profile lookup and provisioning.
    pub fn directory(&self) -> &PrincipalDirectory {
        &self.directory
    }

    /// Session audit log.
    pub fn recorder(&self) -> &SessionRecorder {
        &self.recorder
    }

    /// Presence heartbeats and rosters.
    pub fn tracker(&self) -> &PresenceTracker {
        &self.tracker
    }

    /// Role normalization rules in effect.
    pub fn resolver(&self) -> &RoleResolver {
        &self.resolver
    }

    /// Start a session for an authenticated principal.
    ///
    /// Opens the audit session, starts the heartbeat, and arms the toast
    /// feed and unread inbox. Only an inactive principal makes this fail;
    /// a session record that cannot be written is logged and skipped.
    pub async fn sign_in(&self, principal: Principal, client: ClientInfo) -> AppResult<SessionContext> {
        let principal = self.resolver.normalize_principal(principal);
        if !principal.active {
            warn!(principal_id = %principal.id, "Sign-in refused for inactive principal");
            return Err(AppError::authorization(format!(
                "Principal {} is inactive",
                principal.id
            )));
        }

        let device = DeviceFingerprint::from_user_agent(client.user_agent.as_deref());
        let session_id = match self
            .recorder
            .open_session(&principal, &device, client.geo.as_ref())
            .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(principal_id = %principal.id, error = %e, "Failed to open session record");
                None
            }
        };

        let cancel = CancellationToken::new();
        let heartbeat = self
            .tracker
            .start_heartbeat(principal.clone(), cancel.child_token());
        let feed = self.feed.spawn(principal.clone(), cancel.child_token());
        let unread = UnreadNotificationStore::new(
            self.store.clone(),
            self.clock.clone(),
            principal.clone(),
            &self.config.notifications,
            ListView::Compact,
        );
        let unread_task = tokio::spawn(unread.clone().run(cancel.child_token()));

        info!(
            principal_id = %principal.id,
            tenant_id = %principal.tenant_id,
            role = %principal.role,
            session_id = ?session_id,
            "Signed in"
        );

        Ok(SessionContext {
            principal,
            session_id,
            recorder: self.recorder.clone(),
            tracker: self.tracker.clone(),
            heartbeat: Some(heartbeat),
            feed: Some(feed),
            unread,
            unread_task: Some(unread_task),
            cancel,
        })
    }
}

/// Everything alive for one signed-in principal.
///
/// Call [`sign_out`](Self::sign_out) to close the audit session. Dropping
/// the context only cancels its loops; the audit session stays open until
/// the next sign-in in this process closes it.
pub struct SessionContext {
    principal: Principal,
    session_id: Option<SessionId>,
    recorder: Arc<SessionRecorder>,
    tracker: PresenceTracker,
    heartbeat: Option<HeartbeatHandle>,
    feed: Option<FeedHandle>,
    unread: UnreadNotificationStore,
    unread_task: Option<JoinHandle<()>>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("principal_id", &self.principal.id)
            .field("session_id", &self.session_id)
            .finish()
    }
}

impl SessionContext {
    /// The signed-in principal, role normalized.
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Audit session id, if the record could be opened.
    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id
    }

    /// Current toasts, newest first.
    pub fn toasts(&self) -> Vec<Toast> {
        self.feed.as_ref().map(FeedHandle::toasts).unwrap_or_default()
    }

    /// Receiver for toast list changes.
    pub fn subscribe_toasts(&self) -> Option<watch::Receiver<Vec<Toast>>> {
        self.feed.as_ref().map(FeedHandle::subscribe)
    }

    /// Dismiss a toast.
    pub fn dismiss_toast(&self, id: EventId) -> bool {
        self.feed.as_ref().is_some_and(|feed| feed.dismiss(id))
    }

    /// The unread inbox.
    pub fn unread(&self) -> &UnreadNotificationStore {
        &self.unread
    }

    /// One-shot roster, empty unless the principal may see presence.
    pub async fn roster(&self) -> Roster {
        self.tracker.read_roster(&self.principal).await
    }

    /// Live roster, empty unless the principal may see presence.
    pub async fn subscribe_roster(&self) -> RosterStream {
        self.tracker.subscribe_roster(&self.principal).await
    }

    /// Tenant connection history, empty unless privileged.
    pub async fn session_history(&self, limit: usize) -> AppResult<Vec<Session>> {
        self.recorder.list_sessions(&self.principal, limit).await
    }

    /// Tear the session down: stop every loop, then close the audit
    /// session. A failed close is logged and does not fail sign-out.
    pub async fn sign_out(mut self) {
        self.cancel.cancel();

        if let Some(heartbeat) = self.heartbeat.take() {
            heartbeat.stop().await;
        }
        if let Some(feed) = self.feed.take() {
            feed.stop().await;
        }
        if let Some(task) = self.unread_task.take() {
            if let Err(e) = task.await {
                debug!(error = %e, "Notification task ended abnormally");
            }
        }

        if let Some(id) = self.session_id {
            match self.recorder.close_session(id).await {
                Ok(true) => {}
                Ok(false) => debug!(session_id = %id, "Session was already closed"),
                Err(e) => warn!(session_id = %id, error = %e, "Failed to close session"),
            }
        }

        info!(principal_id = %self.principal.id, "Signed out");
    }
}

impl Drop for SessionContext {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
