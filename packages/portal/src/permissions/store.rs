use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::Utc;
use common::ObjectRef;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect, Set,
    sea_query::OnConflict,
};

use crate::entity::{object_permission, role_assignment};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Permission store database error: {0}")]
    Db(#[from] DbErr),
}

/// Per-object capability storage consulted and updated by the grant engine.
///
/// Granting something already held and revoking something absent are both no-ops.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    async fn has_capability(
        &self,
        user_id: i32,
        capability: &str,
        target: ObjectRef,
    ) -> Result<bool, StoreError>;

    async fn grant(
        &self,
        user_id: i32,
        capability: &str,
        target: ObjectRef,
    ) -> Result<(), StoreError>;

    async fn revoke(
        &self,
        user_id: i32,
        capability: &str,
        target: ObjectRef,
    ) -> Result<(), StoreError>;

    /// All capabilities the user holds on the target.
    async fn capabilities(
        &self,
        user_id: i32,
        target: ObjectRef,
    ) -> Result<BTreeSet<String>, StoreError>;

    /// Role ids the user currently holds on the target.
    async fn held_roles(&self, user_id: i32, target: ObjectRef) -> Result<Vec<String>, StoreError>;

    async fn record_role(
        &self,
        user_id: i32,
        role_id: &str,
        target: ObjectRef,
    ) -> Result<(), StoreError>;

    /// Returns `true` if the role was held.
    async fn forget_role(
        &self,
        user_id: i32,
        role_id: &str,
        target: ObjectRef,
    ) -> Result<bool, StoreError>;
}

/// [`PermissionStore`] backed by the `object_permission` and `role_assignment` tables.
///
/// Works on a pooled connection or an open transaction, so grants commit or roll
/// back together with the membership change that caused them.
pub struct DbPermissionStore<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> DbPermissionStore<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Drop every capability and role anyone holds on `target`.
    ///
    /// Returns the number of capability rows removed.
    pub async fn forget_target(&self, target: ObjectRef) -> Result<u64, StoreError> {
        role_assignment::Entity::delete_many()
            .filter(role_assignment::Column::TargetKind.eq(target.kind.as_str()))
            .filter(role_assignment::Column::TargetId.eq(target.id))
            .exec(self.conn)
            .await?;
        let res = object_permission::Entity::delete_many()
            .filter(object_permission::Column::TargetKind.eq(target.kind.as_str()))
            .filter(object_permission::Column::TargetId.eq(target.id))
            .exec(self.conn)
            .await?;
        Ok(res.rows_affected)
    }
}

#[async_trait]
impl<C: ConnectionTrait + Send + Sync> PermissionStore for DbPermissionStore<'_, C> {
    async fn has_capability(
        &self,
        user_id: i32,
        capability: &str,
        target: ObjectRef,
    ) -> Result<bool, StoreError> {
        let found = object_permission::Entity::find()
            .filter(object_permission::Column::UserId.eq(user_id))
            .filter(object_permission::Column::Capability.eq(capability))
            .filter(object_permission::Column::TargetKind.eq(target.kind.as_str()))
            .filter(object_permission::Column::TargetId.eq(target.id))
            .one(self.conn)
            .await?;
        Ok(found.is_some())
    }

    async fn grant(
        &self,
        user_id: i32,
        capability: &str,
        target: ObjectRef,
    ) -> Result<(), StoreError> {
        let model = object_permission::ActiveModel {
            user_id: Set(user_id),
            capability: Set(capability.to_string()),
            target_kind: Set(target.kind.as_str().to_string()),
            target_id: Set(target.id),
            granted_at: Set(Utc::now()),
        };

        let result = object_permission::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    object_permission::Column::UserId,
                    object_permission::Column::Capability,
                    object_permission::Column::TargetKind,
                    object_permission::Column::TargetId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await;

        match result {
            Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn revoke(
        &self,
        user_id: i32,
        capability: &str,
        target: ObjectRef,
    ) -> Result<(), StoreError> {
        object_permission::Entity::delete_many()
            .filter(object_permission::Column::UserId.eq(user_id))
            .filter(object_permission::Column::Capability.eq(capability))
            .filter(object_permission::Column::TargetKind.eq(target.kind.as_str()))
            .filter(object_permission::Column::TargetId.eq(target.id))
            .exec(self.conn)
            .await?;
        Ok(())
    }

    async fn capabilities(
        &self,
        user_id: i32,
        target: ObjectRef,
    ) -> Result<BTreeSet<String>, StoreError> {
        let codes: Vec<String> = object_permission::Entity::find()
            .filter(object_permission::Column::UserId.eq(user_id))
            .filter(object_permission::Column::TargetKind.eq(target.kind.as_str()))
            .filter(object_permission::Column::TargetId.eq(target.id))
            .select_only()
            .column(object_permission::Column::Capability)
            .into_tuple()
            .all(self.conn)
            .await?;
        Ok(codes.into_iter().collect())
    }

    async fn held_roles(&self, user_id: i32, target: ObjectRef) -> Result<Vec<String>, StoreError> {
        let roles: Vec<String> = role_assignment::Entity::find()
            .filter(role_assignment::Column::UserId.eq(user_id))
            .filter(role_assignment::Column::TargetKind.eq(target.kind.as_str()))
            .filter(role_assignment::Column::TargetId.eq(target.id))
            .select_only()
            .column(role_assignment::Column::RoleId)
            .into_tuple()
            .all(self.conn)
            .await?;
        Ok(roles)
    }

    async fn record_role(
        &self,
        user_id: i32,
        role_id: &str,
        target: ObjectRef,
    ) -> Result<(), StoreError> {
        let model = role_assignment::ActiveModel {
            user_id: Set(user_id),
            role_id: Set(role_id.to_string()),
            target_kind: Set(target.kind.as_str().to_string()),
            target_id: Set(target.id),
            assigned_at: Set(Utc::now()),
        };

        let result = role_assignment::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    role_assignment::Column::UserId,
                    role_assignment::Column::RoleId,
                    role_assignment::Column::TargetKind,
                    role_assignment::Column::TargetId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await;

        match result {
            Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn forget_role(
        &self,
        user_id: i32,
        role_id: &str,
        target: ObjectRef,
    ) -> Result<bool, StoreError> {
        let res = role_assignment::Entity::delete_many()
            .filter(role_assignment::Column::UserId.eq(user_id))
            .filter(role_assignment::Column::RoleId.eq(role_id))
            .filter(role_assignment::Column::TargetKind.eq(target.kind.as_str()))
            .filter(role_assignment::Column::TargetId.eq(target.id))
            .exec(self.conn)
            .await?;
        Ok(res.rows_affected > 0)
    }
}
