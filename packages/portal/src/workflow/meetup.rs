use chrono::Utc;
use common::permission::{MEETUP_LOCATION_MEMBER, MEETUP_LOCATION_ORGANIZER, capability};
use common::{CommentTarget, ObjectRef, RequestStatus, WorkflowStatus};
use sea_orm::sea_query::{LockType, Query as SeaQuery};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr, TransactionTrait,
};
use tracing::info;

use super::membership::upsert_location_member;
use super::{Outcome, Workflow, messages, slug_conflict};
use crate::entity::{comment, meetup, meetup_request, rsvp, support_request};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::meetup::{ProposeMeetupRequest, UpdateMeetupRequest};
use crate::notify::{Notice, NoticeKind};
use crate::permissions::{DbPermissionStore, RoleGrantEngine};
use crate::utils::access::{
    find_location, find_meetup, find_user, notice_recipients, require_capability,
};

async fn load_meetup_request<C: ConnectionTrait>(
    txn: &C,
    location_id: i32,
    request_id: i32,
) -> Result<meetup_request::Model, AppError> {
    let request = meetup_request::Entity::find_by_id(request_id)
        .filter(meetup_request::Column::LocationId.eq(location_id))
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Meetup request not found".into()))?;
    if request.status.is_final() {
        return Err(AppError::Conflict(format!(
            "Meetup request has already been {}",
            request.status
        )));
    }
    Ok(request)
}

/// Delete a meetup together with its support requests, answers and comments.
pub(super) async fn purge_meetup<C: ConnectionTrait>(
    txn: &C,
    meetup_id: i32,
) -> Result<(), AppError> {
    comment::Entity::delete_many()
        .filter(comment::Column::Target.eq(CommentTarget::SupportRequest))
        .filter(
            comment::Column::TargetId.in_subquery(
                SeaQuery::select()
                    .column(support_request::Column::Id)
                    .from(support_request::Entity)
                    .and_where(support_request::Column::MeetupId.eq(meetup_id))
                    .to_owned(),
            ),
        )
        .exec(txn)
        .await?;
    comment::Entity::delete_many()
        .filter(comment::Column::Target.eq(CommentTarget::Meetup))
        .filter(comment::Column::TargetId.eq(meetup_id))
        .exec(txn)
        .await?;
    support_request::Entity::delete_many()
        .filter(support_request::Column::MeetupId.eq(meetup_id))
        .exec(txn)
        .await?;
    rsvp::Entity::delete_many()
        .filter(rsvp::Column::MeetupId.eq(meetup_id))
        .exec(txn)
        .await?;
    meetup::Entity::delete_by_id(meetup_id).exec(txn).await?;
    Ok(())
}

impl Workflow<'_> {
    /// Create a meetup without going through a request. Site administrators only.
    pub async fn create_meetup(
        &self,
        caller: &AuthUser,
        location_id: i32,
        payload: ProposeMeetupRequest,
    ) -> Result<meetup::Model, AppError> {
        caller.require_superuser()?;

        let slug = payload.slug.trim().to_string();
        let txn = self.db.begin().await?;
        find_location(&txn, location_id).await?;
        let meetup = meetup::ActiveModel {
            title: Set(payload.title.trim().to_string()),
            slug: Set(slug.clone()),
            date: Set(payload.date),
            time: Set(payload.time),
            venue: Set(payload.venue),
            description: Set(payload.description),
            location_id: Set(location_id),
            created_by: Set(caller.user_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| slug_conflict(e, &slug))?;
        txn.commit().await?;

        info!(meetup_id = meetup.id, location_id, slug = %meetup.slug, created_by = caller.user_id, "Meetup created");
        Ok(meetup)
    }

    /// Change a meetup's details. An empty payload returns it unchanged.
    pub async fn update_meetup(
        &self,
        caller: &AuthUser,
        location_id: i32,
        meetup_id: i32,
        payload: UpdateMeetupRequest,
    ) -> Result<meetup::Model, AppError> {
        caller.require_superuser()?;

        if payload == UpdateMeetupRequest::default() {
            return find_meetup(self.db, location_id, meetup_id).await;
        }

        let txn = self.db.begin().await?;
        let existing = find_meetup(&txn, location_id, meetup_id).await?;
        let mut active: meetup::ActiveModel = existing.into();

        if let Some(ref title) = payload.title {
            active.title = Set(title.trim().to_string());
        }
        let slug = payload.slug.map(|s| s.trim().to_string());
        if let Some(ref slug) = slug {
            active.slug = Set(slug.clone());
        }
        if let Some(date) = payload.date {
            active.date = Set(date);
        }
        if let Some(time) = payload.time {
            active.time = Set(time);
        }
        if let Some(venue) = payload.venue {
            active.venue = Set(venue);
        }
        if let Some(description) = payload.description {
            active.description = Set(description);
        }

        let meetup = active
            .update(&txn)
            .await
            .map_err(|e| slug_conflict(e, slug.as_deref().unwrap_or_default()))?;
        txn.commit().await?;

        info!(meetup_id, location_id, updated_by = caller.user_id, "Meetup updated");
        Ok(meetup)
    }

    pub async fn delete_meetup(
        &self,
        caller: &AuthUser,
        location_id: i32,
        meetup_id: i32,
    ) -> Result<(), AppError> {
        caller.require_superuser()?;

        let txn = self.db.begin().await?;
        find_meetup(&txn, location_id, meetup_id).await?;
        purge_meetup(&txn, meetup_id).await?;
        txn.commit().await?;

        info!(meetup_id, location_id, deleted_by = caller.user_id, "Meetup deleted");
        Ok(())
    }

    /// Propose a meetup at a location for its organizers to review.
    pub async fn propose_meetup(
        &self,
        caller: &AuthUser,
        location_id: i32,
        payload: ProposeMeetupRequest,
    ) -> Result<Outcome<meetup_request::Model>, AppError> {
        let target = ObjectRef::meetup_location(location_id);
        let slug = payload.slug.trim().to_string();
        let txn = self.db.begin().await?;
        let location = find_location(&txn, location_id).await?;

        let duplicate = meetup_request::Entity::find()
            .filter(meetup_request::Column::LocationId.eq(location_id))
            .filter(meetup_request::Column::Slug.eq(slug.as_str()))
            .filter(meetup_request::Column::Status.eq(RequestStatus::Pending))
            .one(&txn)
            .await?;
        if duplicate.is_some() {
            return Ok(Outcome::refused(
                WorkflowStatus::AlreadyRequested,
                messages::meetup_already_requested(&slug),
            ));
        }

        let inserted = meetup_request::ActiveModel {
            title: Set(payload.title.trim().to_string()),
            slug: Set(slug.clone()),
            date: Set(payload.date),
            time: Set(payload.time),
            venue: Set(payload.venue),
            description: Set(payload.description),
            location_id: Set(location_id),
            created_by: Set(caller.user_id),
            status: Set(RequestStatus::Pending),
            approved_by: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await;
        let request = match inserted {
            Ok(request) => request,
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                tracing::debug!(location_id, slug = %slug, "Meetup proposal raced on insert");
                return Ok(Outcome::refused(
                    WorkflowStatus::AlreadyRequested,
                    messages::meetup_already_requested(&slug),
                ));
            }
            Err(e) => return Err(e.into()),
        };
        txn.commit().await?;

        info!(request_id = request.id, location_id, slug = %request.slug, created_by = caller.user_id, "Meetup proposed");
        let reviewers =
            notice_recipients(self.db, capability::APPROVE_MEETUP_REQUEST, target).await;
        self.notify(Notice::new(
            NoticeKind::MeetupRequested,
            reviewers,
            format!(
                "{} proposed the meetup {} at meetup location {}.",
                caller.username, request.title, location.name
            ),
        ))
        .await;

        Ok(Outcome::ok(messages::MEETUP_REQUEST_SUBMITTED, request))
    }

    /// Pending meetup requests at a location, soonest date first.
    pub async fn pending_meetup_requests(
        &self,
        caller: &AuthUser,
        location_id: i32,
    ) -> Result<Vec<meetup_request::Model>, AppError> {
        let target = ObjectRef::meetup_location(location_id);
        find_location(self.db, location_id).await?;
        require_capability(self.db, caller, capability::VIEW_MEETUP_REQUEST, target).await?;

        let requests = meetup_request::Entity::find()
            .filter(meetup_request::Column::LocationId.eq(location_id))
            .filter(meetup_request::Column::Status.eq(RequestStatus::Pending))
            .order_by_asc(meetup_request::Column::Date)
            .order_by_asc(meetup_request::Column::Time)
            .all(self.db)
            .await?;
        Ok(requests)
    }

    /// Turn a pending request into a meetup and make its requester an organizer.
    ///
    /// A taken slug leaves the request pending and changes nothing.
    pub async fn approve_meetup_request(
        &self,
        caller: &AuthUser,
        location_id: i32,
        request_id: i32,
    ) -> Result<Outcome<meetup::Model>, AppError> {
        let target = ObjectRef::meetup_location(location_id);
        let txn = self.db.begin().await?;
        find_location(&txn, location_id).await?;
        require_capability(&txn, caller, capability::APPROVE_MEETUP_REQUEST, target).await?;
        let request = load_meetup_request(&txn, location_id, request_id).await?;

        let slug_taken = meetup::Entity::find()
            .filter(meetup::Column::Slug.eq(request.slug.as_str()))
            .one(&txn)
            .await?
            .is_some();
        if slug_taken {
            return Ok(Outcome::refused(
                WorkflowStatus::SlugAlreadyExists,
                messages::slug_already_exists(&request.slug),
            ));
        }
        let requester = find_user(&txn, request.created_by).await?;

        let inserted = meetup::ActiveModel {
            title: Set(request.title.clone()),
            slug: Set(request.slug.clone()),
            date: Set(request.date),
            time: Set(request.time),
            venue: Set(request.venue.clone()),
            description: Set(request.description.clone()),
            location_id: Set(location_id),
            created_by: Set(requester.id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await;
        let meetup = match inserted {
            Ok(m) => m,
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                tracing::debug!(request_id, slug = %request.slug, "Meetup slug raced on insert");
                return Ok(Outcome::refused(
                    WorkflowStatus::SlugAlreadyExists,
                    messages::slug_already_exists(&request.slug),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        upsert_location_member(&txn, location_id, requester.id, true).await?;
        let store = DbPermissionStore::new(&txn);
        let roles = RoleGrantEngine::new(self.catalog, &store);
        roles
            .grant_role(requester.id, MEETUP_LOCATION_MEMBER, target)
            .await?;
        roles
            .grant_role(requester.id, MEETUP_LOCATION_ORGANIZER, target)
            .await?;

        let mut active: meetup_request::ActiveModel = request.into();
        active.status = Set(RequestStatus::Approved);
        active.approved_by = Set(Some(caller.user_id));
        active.update(&txn).await?;
        txn.commit().await?;

        info!(request_id, meetup_id = meetup.id, location_id, approved_by = caller.user_id, "Meetup request approved");
        self.notify(Notice::new(
            NoticeKind::MeetupApproved,
            vec![requester.id],
            format!("Your meetup {} has been approved.", meetup.title),
        ))
        .await;

        Ok(Outcome::ok(messages::MEETUP_CREATED, meetup))
    }

    /// Reject a pending meetup request. The request is deleted.
    pub async fn reject_meetup_request(
        &self,
        caller: &AuthUser,
        location_id: i32,
        request_id: i32,
    ) -> Result<Outcome<meetup_request::Model>, AppError> {
        let target = ObjectRef::meetup_location(location_id);
        let txn = self.db.begin().await?;
        find_location(&txn, location_id).await?;
        require_capability(&txn, caller, capability::REJECT_MEETUP_REQUEST, target).await?;
        let request = load_meetup_request(&txn, location_id, request_id).await?;

        meetup_request::Entity::delete_by_id(request.id)
            .exec(&txn)
            .await?;
        txn.commit().await?;

        info!(request_id, location_id, rejected_by = caller.user_id, "Meetup request rejected");
        self.notify(Notice::new(
            NoticeKind::MeetupRejected,
            vec![request.created_by],
            format!("Your meetup request {} has been rejected.", request.title),
        ))
        .await;

        Ok(Outcome::ok(messages::MEETUP_REQUEST_REJECTED, request))
    }
}
