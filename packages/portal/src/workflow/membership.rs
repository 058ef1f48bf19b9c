use chrono::Utc;
use common::membership::{JoinPlan, Standing, UpgradePlan, plan_join, plan_upgrade};
use common::permission::{MEETUP_LOCATION_MEMBER, MEETUP_LOCATION_ORGANIZER, capability};
use common::{ObjectKind, ObjectRef, RequestKind, RequestStatus, WorkflowStatus};
use sea_orm::sea_query::{LockType, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr, TransactionTrait,
};
use tracing::info;

use super::{Outcome, Workflow, describe, messages};
use crate::entity::{community_member, location_member, membership_request};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::notify::{Notice, NoticeKind};
use crate::permissions::{DbPermissionStore, RoleGrantEngine};
use crate::utils::access::{
    community_standing, find_user, location_standing, notice_recipients, require_capability,
};

fn join_kind(target: ObjectKind) -> RequestKind {
    match target {
        ObjectKind::Community => RequestKind::CommunityJoin,
        ObjectKind::MeetupLocation => RequestKind::LocationJoin,
    }
}

fn kinds_for(target: ObjectKind) -> Vec<RequestKind> {
    match target {
        ObjectKind::Community => vec![RequestKind::CommunityJoin],
        ObjectKind::MeetupLocation => vec![RequestKind::LocationJoin, RequestKind::LocationUpgrade],
    }
}

/// Capability needed to see the pending requests of a target.
fn review_capability(target: ObjectKind) -> &'static str {
    match target {
        ObjectKind::Community => capability::APPROVE_COMMUNITY_JOINREQUEST,
        ObjectKind::MeetupLocation => capability::APPROVE_LOCATION_JOINREQUEST,
    }
}

fn approve_capability(kind: RequestKind) -> &'static str {
    match kind {
        RequestKind::CommunityJoin => capability::APPROVE_COMMUNITY_JOINREQUEST,
        RequestKind::LocationJoin => capability::APPROVE_LOCATION_JOINREQUEST,
        RequestKind::LocationUpgrade => capability::ADD_LOCATION_ORGANIZER,
    }
}

// Communities have no separate reject code; approvers reject too.
fn reject_capability(kind: RequestKind) -> &'static str {
    match kind {
        RequestKind::CommunityJoin => capability::APPROVE_COMMUNITY_JOINREQUEST,
        RequestKind::LocationJoin | RequestKind::LocationUpgrade => {
            capability::REJECT_LOCATION_JOINREQUEST
        }
    }
}

async fn standing_in<C: ConnectionTrait>(
    db: &C,
    target: ObjectRef,
    user_id: i32,
) -> Result<Standing, AppError> {
    match target.kind {
        ObjectKind::Community => community_standing(db, target.id, user_id).await,
        ObjectKind::MeetupLocation => location_standing(db, target.id, user_id).await,
    }
}

pub(super) async fn find_pending_request<C: ConnectionTrait>(
    db: &C,
    kind: RequestKind,
    target_id: i32,
    requester_id: i32,
) -> Result<Option<membership_request::Model>, DbErr> {
    membership_request::Entity::find()
        .filter(membership_request::Column::Kind.eq(kind))
        .filter(membership_request::Column::TargetId.eq(target_id))
        .filter(membership_request::Column::RequesterId.eq(requester_id))
        .filter(membership_request::Column::Status.eq(RequestStatus::Pending))
        .one(db)
        .await
}

/// Insert a pending request. `None` when a concurrent caller already holds the
/// pending slot for the same (kind, target, requester).
async fn insert_pending_request<C: ConnectionTrait>(
    db: &C,
    kind: RequestKind,
    target_id: i32,
    requester_id: i32,
) -> Result<Option<membership_request::Model>, AppError> {
    let model = membership_request::ActiveModel {
        kind: Set(kind),
        target_id: Set(target_id),
        requester_id: Set(requester_id),
        status: Set(RequestStatus::Pending),
        decided_by: Set(None),
        decided_at: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    match model.insert(db).await {
        Ok(inserted) => Ok(Some(inserted)),
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            tracing::debug!(%kind, target_id, requester_id, "Pending request raced on insert");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Mark a pending request approved by `decided_by`.
pub(super) async fn settle_request<C: ConnectionTrait>(
    db: &C,
    request: membership_request::Model,
    decided_by: i32,
) -> Result<membership_request::Model, DbErr> {
    let mut active: membership_request::ActiveModel = request.into();
    active.status = Set(RequestStatus::Approved);
    active.decided_by = Set(Some(decided_by));
    active.decided_at = Set(Some(Utc::now()));
    active.update(db).await
}

pub(super) async fn add_community_member<C: ConnectionTrait>(
    db: &C,
    community_id: i32,
    user_id: i32,
) -> Result<(), DbErr> {
    let model = community_member::ActiveModel {
        community_id: Set(community_id),
        user_id: Set(user_id),
        joined_at: Set(Utc::now()),
    };
    let result = community_member::Entity::insert(model)
        .on_conflict(
            OnConflict::columns([
                community_member::Column::CommunityId,
                community_member::Column::UserId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Make sure `user_id` belongs to the location, raising them to organizer when
/// asked. Never lowers an existing organizer.
pub(super) async fn upsert_location_member<C: ConnectionTrait>(
    db: &C,
    location_id: i32,
    user_id: i32,
    organizer: bool,
) -> Result<location_member::Model, DbErr> {
    match location_member::Entity::find_by_id((location_id, user_id))
        .one(db)
        .await?
    {
        Some(existing) if existing.is_organizer || !organizer => Ok(existing),
        Some(existing) => {
            let mut active: location_member::ActiveModel = existing.into();
            active.is_organizer = Set(true);
            active.update(db).await
        }
        None => {
            location_member::ActiveModel {
                location_id: Set(location_id),
                user_id: Set(user_id),
                is_organizer: Set(organizer),
                joined_at: Set(Utc::now()),
            }
            .insert(db)
            .await
        }
    }
}

impl Workflow<'_> {
    /// Ask to join a community or meetup location.
    pub async fn request_join(
        &self,
        caller: &AuthUser,
        target: ObjectRef,
    ) -> Result<Outcome<membership_request::Model>, AppError> {
        let kind = join_kind(target.kind);
        let txn = self.db.begin().await?;
        let what = describe(&txn, target).await?;

        let standing = standing_in(&txn, target, caller.user_id).await?;
        let pending = find_pending_request(&txn, kind, target.id, caller.user_id).await?;
        match plan_join(standing, pending.is_some()) {
            JoinPlan::AlreadyMember => {
                return Ok(Outcome::refused(
                    WorkflowStatus::AlreadyMember,
                    messages::already_member(&what),
                ));
            }
            JoinPlan::AlreadyRequested => {
                return Ok(Outcome::refused(
                    WorkflowStatus::AlreadyRequested,
                    messages::join_already_requested(&what),
                ));
            }
            JoinPlan::Create => {}
        }

        let Some(request) = insert_pending_request(&txn, kind, target.id, caller.user_id).await?
        else {
            return Ok(Outcome::refused(
                WorkflowStatus::AlreadyRequested,
                messages::join_already_requested(&what),
            ));
        };
        txn.commit().await?;

        info!(request_id = request.id, %target, user_id = caller.user_id, "Join requested");
        let reviewers = notice_recipients(self.db, review_capability(target.kind), target).await;
        self.notify(Notice::new(
            NoticeKind::JoinRequested,
            reviewers,
            format!("{} asked to join {what}.", caller.username),
        ))
        .await;

        Ok(Outcome::ok(messages::join_requested(&what), request))
    }

    /// Ask to become an organizer of a meetup location the caller belongs to.
    pub async fn request_organizer_upgrade(
        &self,
        caller: &AuthUser,
        location_id: i32,
    ) -> Result<Outcome<membership_request::Model>, AppError> {
        let target = ObjectRef::meetup_location(location_id);
        let txn = self.db.begin().await?;
        let what = describe(&txn, target).await?;

        let standing = location_standing(&txn, location_id, caller.user_id).await?;
        let pending = find_pending_request(
            &txn,
            RequestKind::LocationUpgrade,
            location_id,
            caller.user_id,
        )
        .await?;
        match plan_upgrade(standing, pending.is_some()) {
            UpgradePlan::NotAMember => {
                return Ok(Outcome::refused(
                    WorkflowStatus::NotAMember,
                    messages::not_a_member(&caller.username, &what),
                ));
            }
            UpgradePlan::AlreadyOrganizer => {
                return Ok(Outcome::refused(
                    WorkflowStatus::AlreadyOrganizer,
                    messages::already_organizer(&caller.username, &what),
                ));
            }
            UpgradePlan::AlreadyRequested => {
                return Ok(Outcome::refused(
                    WorkflowStatus::AlreadyRequested,
                    messages::upgrade_already_requested(&what),
                ));
            }
            UpgradePlan::Create => {}
        }

        let Some(request) = insert_pending_request(
            &txn,
            RequestKind::LocationUpgrade,
            location_id,
            caller.user_id,
        )
        .await?
        else {
            return Ok(Outcome::refused(
                WorkflowStatus::AlreadyRequested,
                messages::upgrade_already_requested(&what),
            ));
        };
        txn.commit().await?;

        info!(request_id = request.id, location_id, user_id = caller.user_id, "Organizer upgrade requested");
        let reviewers =
            notice_recipients(self.db, capability::ADD_LOCATION_ORGANIZER, target).await;
        self.notify(Notice::new(
            NoticeKind::OrganizerUpgradeRequested,
            reviewers,
            format!("{} asked to become an organizer of {what}.", caller.username),
        ))
        .await;

        Ok(Outcome::ok(messages::upgrade_requested(&what), request))
    }

    /// Pending join and upgrade requests on a target, oldest first.
    pub async fn pending_membership_requests(
        &self,
        caller: &AuthUser,
        target: ObjectRef,
    ) -> Result<Vec<membership_request::Model>, AppError> {
        describe(self.db, target).await?;
        require_capability(self.db, caller, review_capability(target.kind), target).await?;

        let requests = membership_request::Entity::find()
            .filter(membership_request::Column::Kind.is_in(kinds_for(target.kind)))
            .filter(membership_request::Column::TargetId.eq(target.id))
            .filter(membership_request::Column::Status.eq(RequestStatus::Pending))
            .order_by_asc(membership_request::Column::CreatedAt)
            .all(self.db)
            .await?;
        Ok(requests)
    }

    /// Load a request on `target` for a decision, holding its row lock.
    async fn load_for_decision<C: ConnectionTrait>(
        txn: &C,
        target: ObjectRef,
        request_id: i32,
    ) -> Result<membership_request::Model, AppError> {
        let request = membership_request::Entity::find_by_id(request_id)
            .filter(membership_request::Column::TargetId.eq(target.id))
            .lock(LockType::Update)
            .one(txn)
            .await?
            .filter(|r| r.kind.target_kind() == target.kind)
            .ok_or_else(|| AppError::NotFound("Membership request not found".into()))?;
        Ok(request)
    }

    /// Approve a pending join or upgrade request, adding the membership and the
    /// matching role grants.
    pub async fn approve_membership_request(
        &self,
        caller: &AuthUser,
        target: ObjectRef,
        request_id: i32,
    ) -> Result<Outcome<membership_request::Model>, AppError> {
        let txn = self.db.begin().await?;
        let what = describe(&txn, target).await?;
        let request = Self::load_for_decision(&txn, target, request_id).await?;
        require_capability(&txn, caller, approve_capability(request.kind), target).await?;
        if request.status.is_final() {
            return Err(AppError::Conflict(format!(
                "Membership request has already been {}",
                request.status
            )));
        }
        let requester = find_user(&txn, request.requester_id).await?;

        let store = DbPermissionStore::new(&txn);
        let roles = RoleGrantEngine::new(self.catalog, &store);
        let (notice_kind, message) = match request.kind {
            RequestKind::CommunityJoin => {
                add_community_member(&txn, target.id, requester.id).await?;
                (
                    NoticeKind::JoinApproved,
                    messages::member_added(&requester.username, &what),
                )
            }
            RequestKind::LocationJoin => {
                upsert_location_member(&txn, target.id, requester.id, false).await?;
                roles
                    .grant_role(requester.id, MEETUP_LOCATION_MEMBER, target)
                    .await?;
                (
                    NoticeKind::JoinApproved,
                    messages::member_added(&requester.username, &what),
                )
            }
            RequestKind::LocationUpgrade => {
                if !location_standing(&txn, target.id, requester.id)
                    .await?
                    .is_member()
                {
                    return Ok(Outcome::refused(
                        WorkflowStatus::NotAMember,
                        messages::not_a_member(&requester.username, &what),
                    ));
                }
                upsert_location_member(&txn, target.id, requester.id, true).await?;
                roles
                    .grant_role(requester.id, MEETUP_LOCATION_MEMBER, target)
                    .await?;
                roles
                    .grant_role(requester.id, MEETUP_LOCATION_ORGANIZER, target)
                    .await?;
                (
                    NoticeKind::OrganizerPromoted,
                    messages::organizer_added(&requester.username, &what),
                )
            }
        };

        let request = settle_request(&txn, request, caller.user_id).await?;
        txn.commit().await?;

        info!(request_id, kind = %request.kind, %target, decided_by = caller.user_id, "Membership request approved");
        self.notify(Notice::new(notice_kind, vec![requester.id], message.clone()))
            .await;

        Ok(Outcome::ok(message, request))
    }

    /// Reject a pending join or upgrade request. The request is deleted.
    pub async fn reject_membership_request(
        &self,
        caller: &AuthUser,
        target: ObjectRef,
        request_id: i32,
    ) -> Result<Outcome<membership_request::Model>, AppError> {
        let txn = self.db.begin().await?;
        let what = describe(&txn, target).await?;
        let request = Self::load_for_decision(&txn, target, request_id).await?;
        require_capability(&txn, caller, reject_capability(request.kind), target).await?;
        if request.status.is_final() {
            return Err(AppError::Conflict(format!(
                "Membership request has already been {}",
                request.status
            )));
        }
        let requester = find_user(&txn, request.requester_id).await?;

        membership_request::Entity::delete_by_id(request.id)
            .exec(&txn)
            .await?;
        txn.commit().await?;

        info!(request_id, kind = %request.kind, %target, decided_by = caller.user_id, "Membership request rejected");
        let message = messages::request_rejected(&requester.username, &what);
        self.notify(Notice::new(
            NoticeKind::JoinRejected,
            vec![requester.id],
            message.clone(),
        ))
        .await;

        Ok(Outcome::ok(message, request))
    }
}
