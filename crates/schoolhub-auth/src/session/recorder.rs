//! Connection audit log: one session record per sign-in, closed on every
//! way out.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use schoolhub_core::error::AppError;
use schoolhub_core::result::AppResult;
use schoolhub_core::traits::document_store::{DocumentStore, WriteMode};
use schoolhub_core::types::clock::Clock;
use schoolhub_core::types::document::{Fields, encode_fields};
use schoolhub_core::types::id::{PrincipalId, SessionId};
use schoolhub_core::types::query::Query;
use schoolhub_entity::principal::Principal;
use schoolhub_entity::session::{DeviceInfo, GeoInfo, NewSession, Session};

use crate::rbac::RoleResolver;

/// The session this recorder opened and has not yet closed.
#[derive(Debug, Clone, Copy)]
struct OpenSession {
    id: SessionId,
    principal_id: PrincipalId,
    /// Set when a close attempt failed; the next open retries the close.
    retired: bool,
}

/// Opens and closes session audit records.
///
/// The recorder caches the id of the session it opened, which is what makes
/// `open_session` idempotent for one authentication and lets the next
/// sign-in close a session the previous one left dangling.
pub struct SessionRecorder {
    /// Backing document store.
    store: Arc<dyn DocumentStore>,
    /// Time source for `openedAt`/`closedAt`.
    clock: Arc<dyn Clock>,
    /// Role normalization for history reads.
    resolver: RoleResolver,
    /// Cached open session.
    current: Mutex<Option<OpenSession>>,
}

impl std::fmt::Debug for SessionRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRecorder").finish()
    }
}

impl SessionRecorder {
    /// Creates a new recorder.
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>, resolver: RoleResolver) -> Self {
        Self {
            store,
            clock,
            resolver,
            current: Mutex::new(None),
        }
    }

    /// Open a session for `principal`, or return the one already open for it.
    ///
    /// A cached session belonging to someone else, or one whose close
    /// failed earlier, is closed first. Failure to close it is logged and
    /// does not prevent the new session from opening.
    pub async fn open_session(
        &self,
        principal: &Principal,
        device: &DeviceInfo,
        geo: Option<&GeoInfo>,
    ) -> AppResult<SessionId> {
        let mut current = self.current.lock().await;

        if let Some(open) = *current {
            if open.principal_id == principal.id && !open.retired {
                return Ok(open.id);
            }

            info!(
                session_id = %open.id,
                principal_id = %open.principal_id,
                "Closing dangling session before opening a new one"
            );
            if let Err(e) = self.close_record(open.id).await {
                warn!(session_id = %open.id, error = %e, "Failed to close dangling session");
            }
            *current = None;
        }

        let record = NewSession {
            principal_id: principal.id,
            tenant_id: principal.tenant_id,
            display_name: principal.display_name.clone(),
            role: principal.role.clone(),
            device: device.kind,
            browser: device.browser.clone(),
            os: device.os.clone(),
            location: geo.filter(|g| !g.is_empty()).cloned(),
            opened_at: self.clock.now(),
            closed_at: None,
        };

        let doc_id = self
            .store
            .create(Session::COLLECTION, encode_fields(&record)?)
            .await?;
        let id: SessionId = doc_id
            .parse()
            .map_err(|e| AppError::storage(format!("Store returned invalid session id '{doc_id}': {e}")))?;

        *current = Some(OpenSession {
            id,
            principal_id: principal.id,
            retired: false,
        });

        info!(
            session_id = %id,
            principal_id = %principal.id,
            device = %device.kind,
            browser = %device.browser,
            "Session opened"
        );

        Ok(id)
    }

    /// Close a session. Returns `Ok(false)` when it was already closed.
    ///
    /// On failure the cached session is kept but marked so the next
    /// `open_session` retries the close.
    pub async fn close_session(&self, id: SessionId) -> AppResult<bool> {
        let mut current = self.current.lock().await;
        let result = self.close_record(id).await;

        if current.is_some_and(|open| open.id == id) {
            match result {
                Ok(_) => *current = None,
                Err(_) => {
                    if let Some(open) = current.as_mut() {
                        open.retired = true;
                    }
                }
            }
        }

        result
    }

    /// The session this recorder currently considers open.
    pub async fn current_session(&self) -> Option<SessionId> {
        self.current
            .lock()
            .await
            .filter(|open| !open.retired)
            .map(|open| open.id)
    }

    /// The viewer's tenant connection history, newest first.
    ///
    /// Only admins and managers see anything; everyone else gets an empty
    /// list without the store being queried.
    pub async fn list_sessions(&self, viewer: &Principal, limit: usize) -> AppResult<Vec<Session>> {
        if !self.resolver.can_view_session_history(&viewer.role) {
            return Ok(Vec::new());
        }

        let query = Query::collection(Session::COLLECTION)
            .where_eq("tenantId", viewer.tenant_id)
            .order_desc("openedAt")
            .limit(limit);

        let docs = self.store.read(&query).await?;
        let sessions = docs
            .iter()
            .filter_map(|doc| match doc.decode::<Session>() {
                Ok(mut session) => {
                    session.role = self.resolver.normalize_role(session.role);
                    Some(session)
                }
                Err(e) => {
                    warn!(error = %e, "Skipping malformed session record");
                    None
                }
            })
            .collect();

        Ok(sessions)
    }

    async fn close_record(&self, id: SessionId) -> AppResult<bool> {
        let doc = self
            .store
            .get(Session::COLLECTION, &id.to_doc_id())
            .await?
            .ok_or_else(|| AppError::not_found(format!("Session {id} not found")))?;
        let session: Session = doc.decode()?;

        if !session.is_open() {
            return Ok(false);
        }

        let closed_at = session.close_timestamp(self.clock.now());
        let mut patch = Fields::new();
        patch.insert("closedAt".to_string(), serde_json::to_value(closed_at)?);
        self.store
            .write(Session::COLLECTION, &id.to_doc_id(), patch, WriteMode::Merge)
            .await?;

        info!(
            session_id = %id,
            principal_id = %session.principal_id,
            duration_secs = (closed_at - session.opened_at).num_seconds(),
            "Session closed"
        );

        Ok(true)
    }
}
