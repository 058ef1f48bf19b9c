use chrono::Utc;
use common::permission::capability;
use common::{CommentTarget, ObjectRef};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::info;

use super::Workflow;
use crate::entity::{comment, user};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::comment::CommentRequest;
use crate::utils::access::{find_location, find_meetup, find_support_request, require_capability};

/// What a comment is posted on, addressed through its parents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommentOn {
    Meetup {
        location_id: i32,
        meetup_id: i32,
    },
    SupportRequest {
        location_id: i32,
        meetup_id: i32,
        request_id: i32,
    },
}

impl CommentOn {
    /// The stored `(target, target_id)` pair.
    pub fn target(&self) -> (CommentTarget, i32) {
        match *self {
            Self::Meetup { meetup_id, .. } => (CommentTarget::Meetup, meetup_id),
            Self::SupportRequest { request_id, .. } => (CommentTarget::SupportRequest, request_id),
        }
    }

    /// 404 unless the location, meetup and support request all exist and nest.
    async fn resolve<C: ConnectionTrait>(&self, db: &C) -> Result<(CommentTarget, i32), AppError> {
        match *self {
            Self::Meetup {
                location_id,
                meetup_id,
            } => {
                find_location(db, location_id).await?;
                find_meetup(db, location_id, meetup_id).await?;
            }
            Self::SupportRequest {
                location_id,
                meetup_id,
                request_id,
            } => {
                find_location(db, location_id).await?;
                find_meetup(db, location_id, meetup_id).await?;
                find_support_request(db, meetup_id, request_id).await?;
            }
        }
        Ok(self.target())
    }
}

async fn load_comment<C: ConnectionTrait>(
    db: &C,
    on: CommentOn,
    comment_id: i32,
) -> Result<comment::Model, AppError> {
    let (target, target_id) = on.resolve(db).await?;
    comment::Entity::find_by_id(comment_id)
        .filter(comment::Column::Target.eq(target))
        .filter(comment::Column::TargetId.eq(target_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".into()))
}

/// Only the author edits a comment. Site administrators may also delete it.
fn require_author(caller: &AuthUser, comment: &comment::Model, allow_admin: bool) -> Result<(), AppError> {
    if comment.author_id == caller.user_id || (allow_admin && caller.is_superuser) {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}

impl Workflow<'_> {
    /// Post a comment.
    ///
    /// Any signed-in user may comment on a meetup. Commenting on a support
    /// request needs `add_support_request_comment` on the location.
    pub async fn add_comment(
        &self,
        caller: &AuthUser,
        on: CommentOn,
        payload: CommentRequest,
    ) -> Result<comment::Model, AppError> {
        let txn = self.db.begin().await?;
        let (target, target_id) = on.resolve(&txn).await?;
        if let CommentOn::SupportRequest { location_id, .. } = on {
            require_capability(
                &txn,
                caller,
                capability::ADD_SUPPORT_REQUEST_COMMENT,
                ObjectRef::meetup_location(location_id),
            )
            .await?;
        }

        let comment = comment::ActiveModel {
            target: Set(target),
            target_id: Set(target_id),
            author_id: Set(caller.user_id),
            body: Set(payload.body.trim().to_string()),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        info!(comment_id = comment.id, %target, target_id, author_id = caller.user_id, "Comment added");
        Ok(comment)
    }

    pub async fn edit_comment(
        &self,
        caller: &AuthUser,
        on: CommentOn,
        comment_id: i32,
        payload: CommentRequest,
    ) -> Result<comment::Model, AppError> {
        let txn = self.db.begin().await?;
        let existing = load_comment(&txn, on, comment_id).await?;
        require_author(caller, &existing, false)?;

        let mut active: comment::ActiveModel = existing.into();
        active.body = Set(payload.body.trim().to_string());
        active.updated_at = Set(Some(Utc::now()));
        let comment = active.update(&txn).await?;
        txn.commit().await?;

        info!(comment_id, author_id = caller.user_id, "Comment edited");
        Ok(comment)
    }

    pub async fn delete_comment(
        &self,
        caller: &AuthUser,
        on: CommentOn,
        comment_id: i32,
    ) -> Result<(), AppError> {
        let txn = self.db.begin().await?;
        let existing = load_comment(&txn, on, comment_id).await?;
        require_author(caller, &existing, true)?;

        comment::Entity::delete_by_id(existing.id)
            .exec(&txn)
            .await?;
        txn.commit().await?;

        info!(comment_id, deleted_by = caller.user_id, "Comment deleted");
        Ok(())
    }

    /// Comments in posting order, each with its author.
    pub async fn comments(
        &self,
        on: CommentOn,
    ) -> Result<Vec<(comment::Model, Option<user::Model>)>, AppError> {
        let (target, target_id) = on.resolve(self.db).await?;
        let rows = comment::Entity::find()
            .filter(comment::Column::Target.eq(target))
            .filter(comment::Column::TargetId.eq(target_id))
            .find_also_related(user::Entity)
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(self.db)
            .await?;
        Ok(rows)
    }
}
