use chrono::Utc;
use common::permission::capability;
use common::{CommentTarget, ObjectRef, RequestStatus, WorkflowStatus};
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr, TransactionTrait,
};
use tracing::info;

use super::{Outcome, Workflow, messages};
use crate::entity::{comment, support_request};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::support::{CreateSupportRequest, UpdateSupportRequest};
use crate::notify::{Notice, NoticeKind};
use crate::utils::access::{
    find_location, find_meetup, find_support_request, notice_recipients, require_capability,
};

async fn load_support_request<C: ConnectionTrait>(
    txn: &C,
    meetup_id: i32,
    request_id: i32,
) -> Result<support_request::Model, AppError> {
    let request = support_request::Entity::find_by_id(request_id)
        .filter(support_request::Column::MeetupId.eq(meetup_id))
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Support request not found".into()))?;
    if request.status.is_final() {
        return Err(AppError::Conflict(format!(
            "Support request has already been {}",
            request.status
        )));
    }
    Ok(request)
}

/// Only the volunteer and site administrators may change or withdraw an offer.
fn require_volunteer(caller: &AuthUser, request: &support_request::Model) -> Result<(), AppError> {
    if request.volunteer_id == caller.user_id {
        Ok(())
    } else {
        caller.require_superuser()
    }
}

impl Workflow<'_> {
    /// Volunteer to help at a meetup. Requires membership of its location.
    pub async fn volunteer(
        &self,
        caller: &AuthUser,
        location_id: i32,
        meetup_id: i32,
        payload: CreateSupportRequest,
    ) -> Result<Outcome<support_request::Model>, AppError> {
        let target = ObjectRef::meetup_location(location_id);
        let txn = self.db.begin().await?;
        find_location(&txn, location_id).await?;
        let meetup = find_meetup(&txn, location_id, meetup_id).await?;
        require_capability(&txn, caller, capability::ADD_SUPPORT_REQUEST, target).await?;

        let duplicate = support_request::Entity::find()
            .filter(support_request::Column::MeetupId.eq(meetup_id))
            .filter(support_request::Column::VolunteerId.eq(caller.user_id))
            .filter(support_request::Column::Status.eq(RequestStatus::Pending))
            .one(&txn)
            .await?;
        if duplicate.is_some() {
            return Ok(Outcome::refused(
                WorkflowStatus::AlreadyRequested,
                messages::ALREADY_VOLUNTEERED,
            ));
        }

        let inserted = support_request::ActiveModel {
            meetup_id: Set(meetup_id),
            volunteer_id: Set(caller.user_id),
            description: Set(payload.description.trim().to_string()),
            status: Set(RequestStatus::Pending),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await;
        let request = match inserted {
            Ok(request) => request,
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                tracing::debug!(meetup_id, volunteer_id = caller.user_id, "Support request raced on insert");
                return Ok(Outcome::refused(
                    WorkflowStatus::AlreadyRequested,
                    messages::ALREADY_VOLUNTEERED,
                ));
            }
            Err(e) => return Err(e.into()),
        };
        txn.commit().await?;

        info!(request_id = request.id, meetup_id, volunteer_id = caller.user_id, "Support requested");
        let reviewers =
            notice_recipients(self.db, capability::APPROVE_SUPPORT_REQUEST, target).await;
        self.notify(Notice::new(
            NoticeKind::SupportRequested,
            reviewers,
            format!(
                "{} volunteered to help at {}.",
                caller.username, meetup.title
            ),
        ))
        .await;

        Ok(Outcome::ok(messages::SUPPORT_REQUEST_SUBMITTED, request))
    }

    pub async fn pending_support_requests(
        &self,
        caller: &AuthUser,
        location_id: i32,
        meetup_id: i32,
    ) -> Result<Vec<support_request::Model>, AppError> {
        let target = ObjectRef::meetup_location(location_id);
        find_location(self.db, location_id).await?;
        find_meetup(self.db, location_id, meetup_id).await?;
        require_capability(self.db, caller, capability::APPROVE_SUPPORT_REQUEST, target).await?;

        let requests = support_request::Entity::find()
            .filter(support_request::Column::MeetupId.eq(meetup_id))
            .filter(support_request::Column::Status.eq(RequestStatus::Pending))
            .order_by_asc(support_request::Column::CreatedAt)
            .all(self.db)
            .await?;
        Ok(requests)
    }

    pub async fn approve_support_request(
        &self,
        caller: &AuthUser,
        location_id: i32,
        meetup_id: i32,
        request_id: i32,
    ) -> Result<Outcome<support_request::Model>, AppError> {
        let target = ObjectRef::meetup_location(location_id);
        let txn = self.db.begin().await?;
        find_location(&txn, location_id).await?;
        let meetup = find_meetup(&txn, location_id, meetup_id).await?;
        require_capability(&txn, caller, capability::APPROVE_SUPPORT_REQUEST, target).await?;
        let request = load_support_request(&txn, meetup_id, request_id).await?;

        let mut active: support_request::ActiveModel = request.into();
        active.status = Set(RequestStatus::Approved);
        let request = active.update(&txn).await?;
        txn.commit().await?;

        info!(request_id, meetup_id, approved_by = caller.user_id, "Support request approved");
        self.notify(Notice::new(
            NoticeKind::SupportApproved,
            vec![request.volunteer_id],
            format!("Your offer to help at {} has been accepted.", meetup.title),
        ))
        .await;

        Ok(Outcome::ok(messages::SUPPORT_REQUEST_APPROVED, request))
    }

    /// Reject a pending support request. The request is deleted.
    pub async fn reject_support_request(
        &self,
        caller: &AuthUser,
        location_id: i32,
        meetup_id: i32,
        request_id: i32,
    ) -> Result<Outcome<support_request::Model>, AppError> {
        let target = ObjectRef::meetup_location(location_id);
        let txn = self.db.begin().await?;
        find_location(&txn, location_id).await?;
        find_meetup(&txn, location_id, meetup_id).await?;
        require_capability(&txn, caller, capability::REJECT_SUPPORT_REQUEST, target).await?;
        let request = load_support_request(&txn, meetup_id, request_id).await?;

        support_request::Entity::delete_by_id(request.id)
            .exec(&txn)
            .await?;
        txn.commit().await?;

        info!(request_id, meetup_id, rejected_by = caller.user_id, "Support request rejected");
        Ok(Outcome::ok(messages::SUPPORT_REQUEST_REJECTED, request))
    }

    pub async fn update_support_request(
        &self,
        caller: &AuthUser,
        location_id: i32,
        meetup_id: i32,
        request_id: i32,
        payload: UpdateSupportRequest,
    ) -> Result<support_request::Model, AppError> {
        let txn = self.db.begin().await?;
        find_location(&txn, location_id).await?;
        find_meetup(&txn, location_id, meetup_id).await?;
        let request = find_support_request(&txn, meetup_id, request_id).await?;
        require_volunteer(caller, &request)?;

        let Some(description) = payload.description else {
            return Ok(request);
        };
        let mut active: support_request::ActiveModel = request.into();
        active.description = Set(description.trim().to_string());
        let request = active.update(&txn).await?;
        txn.commit().await?;

        info!(request_id, meetup_id, updated_by = caller.user_id, "Support request updated");
        Ok(request)
    }

    /// Withdraw a support request, whatever its status, with its comments.
    pub async fn delete_support_request(
        &self,
        caller: &AuthUser,
        location_id: i32,
        meetup_id: i32,
        request_id: i32,
    ) -> Result<(), AppError> {
        let txn = self.db.begin().await?;
        find_location(&txn, location_id).await?;
        find_meetup(&txn, location_id, meetup_id).await?;
        let request = find_support_request(&txn, meetup_id, request_id).await?;
        require_volunteer(caller, &request)?;

        comment::Entity::delete_many()
            .filter(comment::Column::Target.eq(CommentTarget::SupportRequest))
            .filter(comment::Column::TargetId.eq(request.id))
            .exec(&txn)
            .await?;
        support_request::Entity::delete_by_id(request.id)
            .exec(&txn)
            .await?;
        txn.commit().await?;

        info!(request_id, meetup_id, deleted_by = caller.user_id, "Support request deleted");
        Ok(())
    }
}
