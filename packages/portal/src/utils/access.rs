use common::ObjectRef;
use common::membership::Standing;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
};

use crate::entity::{
    community, community_member, location_member, meetup, meetup_location, object_permission,
    support_request, user,
};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::permissions::{DbPermissionStore, PermissionStore};

/// Verify the caller holds `capability` on `target`. Superusers always pass.
pub async fn require_capability<C: ConnectionTrait + Send + Sync>(
    db: &C,
    auth_user: &AuthUser,
    capability: &str,
    target: ObjectRef,
) -> Result<(), AppError> {
    if auth_user.is_superuser {
        return Ok(());
    }
    let store = DbPermissionStore::new(db);
    if store
        .has_capability(auth_user.user_id, capability, target)
        .await?
    {
        Ok(())
    } else {
        tracing::debug!(
            user_id = auth_user.user_id,
            capability,
            %target,
            "Capability check failed"
        );
        Err(AppError::PermissionDenied)
    }
}

/// Look up a community by ID, returning 404 if not found.
pub async fn find_community<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<community::Model, AppError> {
    community::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Community not found".into()))
}

/// Look up a meetup location by ID, returning 404 if not found.
pub async fn find_location<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<meetup_location::Model, AppError> {
    meetup_location::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Meetup location not found".into()))
}

/// Lock a meetup location row for the rest of the transaction.
///
/// Serializes organizer changes on the same location so the "last organizer"
/// count cannot go stale between check and write.
pub async fn lock_location<C: ConnectionTrait>(
    txn: &C,
    id: i32,
) -> Result<meetup_location::Model, AppError> {
    meetup_location::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Meetup location not found".into()))
}

/// Look up a meetup that belongs to the given location.
pub async fn find_meetup<C: ConnectionTrait>(
    db: &C,
    location_id: i32,
    meetup_id: i32,
) -> Result<meetup::Model, AppError> {
    meetup::Entity::find_by_id(meetup_id)
        .filter(meetup::Column::LocationId.eq(location_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Meetup not found".into()))
}

/// Look up a support request on the given meetup, whatever its status.
pub async fn find_support_request<C: ConnectionTrait>(
    db: &C,
    meetup_id: i32,
    request_id: i32,
) -> Result<support_request::Model, AppError> {
    support_request::Entity::find_by_id(request_id)
        .filter(support_request::Column::MeetupId.eq(meetup_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Support request not found".into()))
}

pub async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

pub async fn location_standing<C: ConnectionTrait>(
    db: &C,
    location_id: i32,
    user_id: i32,
) -> Result<Standing, AppError> {
    let row = location_member::Entity::find_by_id((location_id, user_id))
        .one(db)
        .await?;
    Ok(Standing::from_row(row.map(|m| m.is_organizer)))
}

pub async fn community_standing<C: ConnectionTrait>(
    db: &C,
    community_id: i32,
    user_id: i32,
) -> Result<Standing, AppError> {
    let is_member = community_member::Entity::find_by_id((community_id, user_id))
        .one(db)
        .await?
        .is_some();
    Ok(if is_member {
        Standing::Member
    } else {
        Standing::Outsider
    })
}

pub async fn organizer_ids<C: ConnectionTrait>(
    db: &C,
    location_id: i32,
) -> Result<Vec<i32>, AppError> {
    let ids = location_member::Entity::find()
        .filter(location_member::Column::LocationId.eq(location_id))
        .filter(location_member::Column::IsOrganizer.eq(true))
        .select_only()
        .column(location_member::Column::UserId)
        .into_tuple()
        .all(db)
        .await?;
    Ok(ids)
}

pub async fn organizer_count<C: ConnectionTrait>(
    db: &C,
    location_id: i32,
) -> Result<u64, AppError> {
    let count = location_member::Entity::find()
        .filter(location_member::Column::LocationId.eq(location_id))
        .filter(location_member::Column::IsOrganizer.eq(true))
        .count(db)
        .await?;
    Ok(count)
}

/// Users holding `capability` on `target`, for addressing notices.
///
/// Runs after the workflow has committed, so a lookup failure is logged and
/// yields no recipients instead of an error.
pub async fn notice_recipients<C: ConnectionTrait>(
    db: &C,
    capability: &str,
    target: ObjectRef,
) -> Vec<i32> {
    let found: Result<Vec<i32>, DbErr> = object_permission::Entity::find()
        .filter(object_permission::Column::Capability.eq(capability))
        .filter(object_permission::Column::TargetKind.eq(target.kind.as_str()))
        .filter(object_permission::Column::TargetId.eq(target.id))
        .select_only()
        .column(object_permission::Column::UserId)
        .into_tuple()
        .all(db)
        .await;
    match found {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!(capability, %target, error = %e, "Failed to look up notice recipients");
            Vec::new()
        }
    }
}
