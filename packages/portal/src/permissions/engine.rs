use common::{ObjectKind, ObjectRef, PermissionCatalog, RoleTemplate};
use tracing::debug;

use super::store::{PermissionStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum GrantError {
    #[error("Unknown role '{0}'")]
    UnknownRole(String),

    #[error("Role '{role}' cannot be granted on a {target}")]
    TargetMismatch { role: String, target: ObjectKind },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Applies and withdraws role templates as per-object capabilities.
///
/// The engine never touches membership rows; callers add or remove members
/// as a separate step.
pub struct RoleGrantEngine<'a, S: PermissionStore + ?Sized> {
    catalog: &'a PermissionCatalog,
    store: &'a S,
}

impl<'a, S: PermissionStore + ?Sized> RoleGrantEngine<'a, S> {
    pub fn new(catalog: &'a PermissionCatalog, store: &'a S) -> Self {
        Self { catalog, store }
    }

    fn template_for(&self, role_id: &str, target: ObjectRef) -> Result<&'a RoleTemplate, GrantError> {
        let template = self
            .catalog
            .template(role_id)
            .ok_or_else(|| GrantError::UnknownRole(role_id.to_string()))?;
        if template.target != target.kind {
            return Err(GrantError::TargetMismatch {
                role: role_id.to_string(),
                target: target.kind,
            });
        }
        Ok(template)
    }

    /// Give `user_id` every capability of `role_id` on `target`. Idempotent.
    pub async fn grant_role(
        &self,
        user_id: i32,
        role_id: &str,
        target: ObjectRef,
    ) -> Result<(), GrantError> {
        let template = self.template_for(role_id, target)?;

        self.store.record_role(user_id, role_id, target).await?;
        for capability in &template.permission_codes {
            self.store.grant(user_id, capability, target).await?;
        }

        debug!(user_id, role_id, %target, "Granted role");
        Ok(())
    }

    /// Withdraw `role_id` from `user_id` on `target`.
    ///
    /// Capabilities still owed to another role the user holds on the same target
    /// are kept. Returns `false` when the role was not held.
    pub async fn revoke_role(
        &self,
        user_id: i32,
        role_id: &str,
        target: ObjectRef,
    ) -> Result<bool, GrantError> {
        let template = self.template_for(role_id, target)?;

        if !self.store.forget_role(user_id, role_id, target).await? {
            return Ok(false);
        }

        let remaining = self.store.held_roles(user_id, target).await?;
        let still_owed = self
            .catalog
            .capabilities_of(remaining.iter().map(String::as_str));

        for capability in &template.permission_codes {
            if !still_owed.contains(capability.as_str()) {
                self.store.revoke(user_id, capability, target).await?;
            }
        }

        debug!(user_id, role_id, %target, kept = still_owed.len(), "Revoked role");
        Ok(true)
    }

    pub async fn holds_role(
        &self,
        user_id: i32,
        role_id: &str,
        target: ObjectRef,
    ) -> Result<bool, GrantError> {
        let roles = self.store.held_roles(user_id, target).await?;
        Ok(roles.iter().any(|r| r == role_id))
    }
}
