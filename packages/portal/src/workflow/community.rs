use chrono::Utc;
use common::permission::{COMMUNITY_LEADER, capability};
use common::{ObjectKind, ObjectRef, WorkflowStatus};
use sea_orm::{ActiveModelTrait, Set, SqlErr, TransactionTrait};
use tracing::info;

use super::membership::add_community_member;
use super::{Outcome, Workflow, messages};
use crate::entity::community;
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::community::CreateCommunityRequest;
use crate::notify::{Notice, NoticeKind};
use crate::permissions::{DbPermissionStore, RoleGrantEngine};
use crate::utils::access::{community_standing, find_community, find_user, require_capability};

/// Result of a community role change.
#[derive(Debug)]
pub struct RoleChange {
    pub user_id: i32,
    pub role: String,
    pub label: String,
}

impl Workflow<'_> {
    /// Create a community. The creator becomes its first member and leader.
    pub async fn create_community(
        &self,
        caller: &AuthUser,
        payload: CreateCommunityRequest,
    ) -> Result<community::Model, AppError> {
        caller.require_superuser()?;

        let slug = payload.slug.trim().to_string();
        let txn = self.db.begin().await?;
        let now = Utc::now();
        let model = community::ActiveModel {
            name: Set(payload.name.trim().to_string()),
            slug: Set(slug.clone()),
            description: Set(payload.description),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict(messages::slug_already_exists(&slug))
            }
            _ => AppError::from(e),
        })?;

        let target = ObjectRef::community(model.id);
        add_community_member(&txn, model.id, caller.user_id).await?;
        let store = DbPermissionStore::new(&txn);
        RoleGrantEngine::new(self.catalog, &store)
            .grant_role(caller.user_id, COMMUNITY_LEADER, target)
            .await?;
        txn.commit().await?;

        info!(community_id = model.id, slug = %model.slug, created_by = caller.user_id, "Community created");
        Ok(model)
    }

    /// Grant a community role. The grantee must already be a member.
    pub async fn grant_community_role(
        &self,
        caller: &AuthUser,
        community_id: i32,
        user_id: i32,
        role: &str,
    ) -> Result<Outcome<RoleChange>, AppError> {
        let target = ObjectRef::community(community_id);
        let txn = self.db.begin().await?;
        let community = find_community(&txn, community_id).await?;
        require_capability(&txn, caller, capability::CHANGE_COMMUNITY, target).await?;
        let grantee = find_user(&txn, user_id).await?;
        let label = self.community_role_label(role, &community.name)?;

        let what = format!("community {}", community.name);
        if !community_standing(&txn, community_id, user_id)
            .await?
            .is_member()
        {
            return Ok(Outcome::refused(
                WorkflowStatus::NotAMember,
                messages::not_a_member(&grantee.username, &what),
            ));
        }

        let store = DbPermissionStore::new(&txn);
        RoleGrantEngine::new(self.catalog, &store)
            .grant_role(user_id, role, target)
            .await?;
        txn.commit().await?;

        info!(community_id, user_id, role, granted_by = caller.user_id, "Community role granted");
        self.notify(Notice::new(
            NoticeKind::RoleGranted,
            vec![user_id],
            format!("You are now {label}."),
        ))
        .await;

        Ok(Outcome::ok(
            format!("{} is now {label}.", grantee.username),
            RoleChange {
                user_id,
                role: role.to_string(),
                label,
            },
        ))
    }

    /// Withdraw a community role. Withdrawing a role that is not held changes nothing.
    pub async fn revoke_community_role(
        &self,
        caller: &AuthUser,
        community_id: i32,
        user_id: i32,
        role: &str,
    ) -> Result<Outcome<RoleChange>, AppError> {
        let target = ObjectRef::community(community_id);
        let txn = self.db.begin().await?;
        let community = find_community(&txn, community_id).await?;
        require_capability(&txn, caller, capability::CHANGE_COMMUNITY, target).await?;
        let grantee = find_user(&txn, user_id).await?;
        let label = self.community_role_label(role, &community.name)?;

        let store = DbPermissionStore::new(&txn);
        let revoked = RoleGrantEngine::new(self.catalog, &store)
            .revoke_role(user_id, role, target)
            .await?;
        txn.commit().await?;

        let message = if revoked {
            info!(community_id, user_id, role, revoked_by = caller.user_id, "Community role revoked");
            format!("{} is no longer {label}.", grantee.username)
        } else {
            format!("{} does not hold {label}.", grantee.username)
        };
        Ok(Outcome::ok(
            message,
            RoleChange {
                user_id,
                role: role.to_string(),
                label,
            },
        ))
    }

    fn community_role_label(&self, role: &str, community_name: &str) -> Result<String, AppError> {
        match self.catalog.template(role) {
            Some(t) if t.target == ObjectKind::Community => Ok(t.label(community_name)),
            Some(_) => Err(AppError::Validation(format!(
                "Role '{role}' cannot be granted on a community"
            ))),
            None => Err(AppError::Validation(format!("Unknown role '{role}'"))),
        }
    }
}
