//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use serde_json::json;

use schoolhub_core::config::AppConfig;
use schoolhub_core::traits::document_store::DocumentStore;
use schoolhub_core::types::clock::ManualClock;
use schoolhub_core::types::document::Fields;
use schoolhub_core::types::id::{EventId, NotificationId, PrincipalId, TenantId};
use schoolhub_entity::notification::{NotificationEvent, PersistedNotification};
use schoolhub_entity::principal::{Principal, Role};
use schoolhub_realtime::PresenceEngine;
use schoolhub_store::MemoryDocumentStore;

/// Desktop Firefox on Linux.
pub const FIREFOX_LINUX: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0";

/// Test application context
pub struct TestApp {
    /// Shared backing store
    pub store: MemoryDocumentStore,
    /// Hand-driven clock shared by the store and every engine
    pub clock: Arc<ManualClock>,
    /// Engine configuration
    pub config: AppConfig,
    /// Engine for the first client
    pub engine: PresenceEngine,
}

impl TestApp {
    /// Create a new test application
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = MemoryDocumentStore::with_clock(clock.clone());
        let config = AppConfig::default();
        let engine = PresenceEngine::new(Arc::new(store.clone()), clock.clone(), config.clone());
        Self {
            store,
            clock,
            config,
            engine,
        }
    }

    /// A separate client process (its own session recorder) on the same
    /// backend.
    pub fn new_client(&self) -> PresenceEngine {
        PresenceEngine::new(
            Arc::new(self.store.clone()),
            self.clock.clone(),
            self.config.clone(),
        )
    }

    /// Build a principal. Nothing is written to the store.
    pub fn principal(&self, role: Role, tenant_id: TenantId, name: &str) -> Principal {
        Principal {
            id: PrincipalId::new(),
            email: format!("{}@school.test", name.to_lowercase()),
            role,
            active: true,
            tenant_id,
            display_name: name.to_string(),
        }
    }

    /// Advance the manual clock.
    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// Publish a feed event from `author`, stamped with the current time.
    pub async fn post_event(&self, author: &Principal, audience: &str, body: &str) -> EventId {
        let fields = json!({
            "tenantId": author.tenant_id,
            "authorId": author.id,
            "authorName": author.display_name,
            "authorRole": author.role.as_str(),
            "body": body,
            "audience": audience,
        });
        self.create(NotificationEvent::COLLECTION, fields).await
    }

    /// Drop a persisted notification into `recipient`'s inbox.
    pub async fn deliver_notification(&self, recipient: &Principal, title: &str) -> NotificationId {
        let fields = json!({
            "recipientId": recipient.id,
            "tenantId": recipient.tenant_id,
            "type": "announcement",
            "payload": {"title": title, "message": format!("{title} (details)")},
            "status": "unread",
            "readAt": null,
        });
        self.create(PersistedNotification::COLLECTION, fields).await
    }

    /// Create a raw document.
    pub async fn create<T: std::str::FromStr>(&self, collection: &str, fields: serde_json::Value) -> T
    where
        T::Err: std::fmt::Debug,
    {
        let fields: Fields = fields.as_object().cloned().expect("fields must be an object");
        let id = self
            .store
            .create(collection, fields)
            .await
            .expect("Failed to create document");
        id.parse().expect("store ids are uuids")
    }
}

/// Let spawned loops drain pending work. Under a paused runtime this also
/// fires the toast prune tick.
pub async fn settle() {
    tokio::time::sleep(StdDuration::from_millis(300)).await;
}
