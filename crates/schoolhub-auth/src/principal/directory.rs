//! Principal profile lookup and provisioning.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use schoolhub_core::error::AppError;
use schoolhub_core::result::AppResult;
use schoolhub_core::traits::document_store::{DocumentStore, WriteMode};
use schoolhub_core::types::document::{Fields, encode_fields};
use schoolhub_core::types::id::{PrincipalId, TenantId};
use schoolhub_entity::principal::{AuthIdentity, Principal, Role};

use crate::rbac::RoleResolver;

/// Reads and edits principal profiles.
pub struct PrincipalDirectory {
    /// Backing document store.
    store: Arc<dyn DocumentStore>,
    /// Applied to every role read from the store.
    resolver: RoleResolver,
}

impl std::fmt::Debug for PrincipalDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrincipalDirectory").finish()
    }
}

impl PrincipalDirectory {
    /// Creates a new directory.
    pub fn new(store: Arc<dyn DocumentStore>, resolver: RoleResolver) -> Self {
        Self { store, resolver }
    }

    /// Look up a profile by id, with its role normalized.
    pub async fn get(&self, id: PrincipalId) -> AppResult<Option<Principal>> {
        let doc = self.store.get(Principal::COLLECTION, &id.to_doc_id()).await?;
        match doc {
            Some(doc) => Ok(Some(self.resolver.normalize_principal(doc.decode()?))),
            None => Ok(None),
        }
    }

    /// Turn an authenticated identity into a principal.
    ///
    /// The first sign-in of an unknown identity provisions a profile: the
    /// principal becomes the admin of a brand new tenant.
    pub async fn resolve(&self, identity: &AuthIdentity) -> AppResult<Principal> {
        if let Some(existing) = self.get(identity.id).await? {
            return Ok(existing);
        }

        let principal = Principal {
            id: identity.id,
            email: identity.email.clone(),
            role: Role::Admin,
            active: true,
            tenant_id: TenantId::new(),
            display_name: identity.fallback_display_name(),
        };

        self.store
            .write(
                Principal::COLLECTION,
                &principal.id.to_doc_id(),
                encode_fields(&principal)?,
                WriteMode::Replace,
            )
            .await?;

        info!(
            principal_id = %principal.id,
            tenant_id = %principal.tenant_id,
            "Provisioned new principal as tenant admin"
        );

        Ok(principal)
    }

    /// Change a principal's role. Only canonical roles (or known aliases)
    /// are accepted.
    pub async fn set_role(&self, id: PrincipalId, raw_role: &str) -> AppResult<Principal> {
        let role = self.resolver.normalize(raw_role);
        if !role.is_recognized() {
            return Err(AppError::validation(format!(
                "Invalid role: '{raw_role}'. Expected one of: admin, manager, teacher, student, guardian"
            )));
        }

        let mut principal = self.require(id).await?;
        self.patch(id, "role", Value::String(role.as_str().to_string()))
            .await?;

        info!(principal_id = %id, role = %role, "Principal role changed");
        principal.role = role;
        Ok(principal)
    }

    /// Change a principal's display name.
    pub async fn update_display_name(&self, id: PrincipalId, name: &str) -> AppResult<Principal> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Display name cannot be empty"));
        }

        let mut principal = self.require(id).await?;
        self.patch(id, "displayName", Value::String(name.to_string()))
            .await?;

        principal.display_name = name.to_string();
        Ok(principal)
    }

    async fn require(&self, id: PrincipalId) -> AppResult<Principal> {
        self.get(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Principal {id} not found")))
    }

    async fn patch(&self, id: PrincipalId, field: &str, value: Value) -> AppResult<()> {
        let mut patch = Fields::new();
        patch.insert(field.to_string(), value);
        self.store
            .write(Principal::COLLECTION, &id.to_doc_id(), patch, WriteMode::Merge)
            .await
    }
}
