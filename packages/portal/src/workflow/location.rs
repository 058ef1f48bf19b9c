use chrono::Utc;
use common::membership::{
    DemotionPlan, PromotionPlan, RemovalPlan, plan_demotion, plan_promotion, plan_removal,
};
use common::permission::{MEETUP_LOCATION_MEMBER, MEETUP_LOCATION_ORGANIZER, capability};
use common::{ObjectRef, RequestKind, RequestStatus, WorkflowStatus};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use tracing::info;

use super::meetup::purge_meetup;
use super::membership::{find_pending_request, settle_request, upsert_location_member};
use super::{Outcome, Workflow, messages, slug_conflict};
use crate::entity::{location_member, meetup, meetup_location, meetup_request, membership_request};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::location::{CreateLocationRequest, UpdateLocationRequest};
use crate::notify::{Notice, NoticeKind};
use crate::permissions::{DbPermissionStore, RoleGrantEngine};
use crate::utils::access::{
    find_location, find_user, location_standing, lock_location, organizer_count,
    require_capability,
};

fn describe_location(location: &meetup_location::Model) -> String {
    format!("meetup location {}", location.name)
}

impl Workflow<'_> {
    /// Create a meetup location. The creator becomes its first organizer.
    pub async fn create_location(
        &self,
        caller: &AuthUser,
        payload: CreateLocationRequest,
    ) -> Result<meetup_location::Model, AppError> {
        caller.require_superuser()?;

        let slug = payload.slug.trim().to_string();
        let txn = self.db.begin().await?;
        let model = meetup_location::ActiveModel {
            name: Set(payload.name.trim().to_string()),
            slug: Set(slug.clone()),
            description: Set(payload.description),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| slug_conflict(e, &slug))?;

        let target = ObjectRef::meetup_location(model.id);
        upsert_location_member(&txn, model.id, caller.user_id, true).await?;
        let store = DbPermissionStore::new(&txn);
        let roles = RoleGrantEngine::new(self.catalog, &store);
        roles
            .grant_role(caller.user_id, MEETUP_LOCATION_MEMBER, target)
            .await?;
        roles
            .grant_role(caller.user_id, MEETUP_LOCATION_ORGANIZER, target)
            .await?;
        txn.commit().await?;

        info!(location_id = model.id, slug = %model.slug, created_by = caller.user_id, "Meetup location created");
        Ok(model)
    }

    /// Rename a location or change its description. Site administrators only.
    pub async fn update_location(
        &self,
        caller: &AuthUser,
        location_id: i32,
        payload: UpdateLocationRequest,
    ) -> Result<meetup_location::Model, AppError> {
        caller.require_superuser()?;

        if payload == UpdateLocationRequest::default() {
            return find_location(self.db, location_id).await;
        }

        let txn = self.db.begin().await?;
        let existing = lock_location(&txn, location_id).await?;
        let mut active: meetup_location::ActiveModel = existing.into();
        if let Some(ref name) = payload.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = payload.description {
            active.description = Set(description);
        }
        let model = active.update(&txn).await?;
        txn.commit().await?;

        info!(location_id, updated_by = caller.user_id, "Meetup location updated");
        Ok(model)
    }

    /// Delete a location with its meetups, members, requests and every grant scoped to it.
    pub async fn delete_location(&self, caller: &AuthUser, location_id: i32) -> Result<(), AppError> {
        caller.require_superuser()?;

        let target = ObjectRef::meetup_location(location_id);
        let txn = self.db.begin().await?;
        lock_location(&txn, location_id).await?;

        let meetup_ids: Vec<i32> = meetup::Entity::find()
            .filter(meetup::Column::LocationId.eq(location_id))
            .select_only()
            .column(meetup::Column::Id)
            .into_tuple()
            .all(&txn)
            .await?;
        for meetup_id in &meetup_ids {
            purge_meetup(&txn, *meetup_id).await?;
        }

        meetup_request::Entity::delete_many()
            .filter(meetup_request::Column::LocationId.eq(location_id))
            .exec(&txn)
            .await?;
        membership_request::Entity::delete_many()
            .filter(
                membership_request::Column::Kind
                    .is_in([RequestKind::LocationJoin, RequestKind::LocationUpgrade]),
            )
            .filter(membership_request::Column::TargetId.eq(location_id))
            .exec(&txn)
            .await?;
        location_member::Entity::delete_many()
            .filter(location_member::Column::LocationId.eq(location_id))
            .exec(&txn)
            .await?;
        let grants = DbPermissionStore::new(&txn).forget_target(target).await?;
        meetup_location::Entity::delete_by_id(location_id)
            .exec(&txn)
            .await?;
        txn.commit().await?;

        info!(location_id, meetups = meetup_ids.len(), grants, deleted_by = caller.user_id, "Meetup location deleted");
        Ok(())
    }

    /// Add a user to a location directly, settling any pending join request of theirs.
    pub async fn add_location_member(
        &self,
        caller: &AuthUser,
        location_id: i32,
        user_id: i32,
    ) -> Result<Outcome<location_member::Model>, AppError> {
        let target = ObjectRef::meetup_location(location_id);
        let txn = self.db.begin().await?;
        let location = find_location(&txn, location_id).await?;
        require_capability(&txn, caller, capability::ADD_LOCATION_MEMBER, target).await?;
        let user = find_user(&txn, user_id).await?;
        let what = describe_location(&location);

        if location_standing(&txn, location_id, user_id)
            .await?
            .is_member()
        {
            return Ok(Outcome::refused(
                WorkflowStatus::AlreadyMember,
                messages::user_already_member(&user.username, &what),
            ));
        }

        let member = upsert_location_member(&txn, location_id, user_id, false).await?;
        let store = DbPermissionStore::new(&txn);
        RoleGrantEngine::new(self.catalog, &store)
            .grant_role(user_id, MEETUP_LOCATION_MEMBER, target)
            .await?;
        if let Some(pending) =
            find_pending_request(&txn, RequestKind::LocationJoin, location_id, user_id).await?
        {
            settle_request(&txn, pending, caller.user_id).await?;
        }
        txn.commit().await?;

        info!(location_id, user_id, added_by = caller.user_id, "Location member added");
        let message = messages::member_added(&user.username, &what);
        self.notify(Notice::new(
            NoticeKind::JoinApproved,
            vec![user_id],
            message.clone(),
        ))
        .await;

        Ok(Outcome::ok(message, member))
    }

    /// Remove a member. Organizers lose both statuses together; the last
    /// organizer cannot be removed.
    pub async fn remove_location_member(
        &self,
        caller: &AuthUser,
        location_id: i32,
        user_id: i32,
    ) -> Result<Outcome<location_member::Model>, AppError> {
        let target = ObjectRef::meetup_location(location_id);
        let txn = self.db.begin().await?;
        let location = lock_location(&txn, location_id).await?;
        require_capability(&txn, caller, capability::DELETE_LOCATION_MEMBER, target).await?;
        let user = find_user(&txn, user_id).await?;
        let what = describe_location(&location);

        let standing = location_standing(&txn, location_id, user_id).await?;
        let organizers = organizer_count(&txn, location_id).await?;
        let plan = plan_removal(standing, organizers);
        match plan {
            RemovalPlan::NotAMember => {
                return Ok(Outcome::refused(
                    WorkflowStatus::NotAMember,
                    messages::not_a_member(&user.username, &what),
                ));
            }
            RemovalPlan::SoleOrganizer => {
                return Ok(Outcome::refused(
                    WorkflowStatus::SoleOrganizer,
                    messages::sole_organizer(&user.username, &what),
                ));
            }
            RemovalPlan::RemoveMember | RemovalPlan::RemoveOrganizerAndMember => {}
        }

        let removed = location_member::Entity::find_by_id((location_id, user_id))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Membership not found".into()))?;
        location_member::Entity::delete_by_id((location_id, user_id))
            .exec(&txn)
            .await?;
        // Pending join and upgrade requests go with the membership
        let dropped = membership_request::Entity::delete_many()
            .filter(
                membership_request::Column::Kind
                    .is_in([RequestKind::LocationJoin, RequestKind::LocationUpgrade]),
            )
            .filter(membership_request::Column::TargetId.eq(location_id))
            .filter(membership_request::Column::RequesterId.eq(user_id))
            .filter(membership_request::Column::Status.eq(RequestStatus::Pending))
            .exec(&txn)
            .await?
            .rows_affected;

        let store = DbPermissionStore::new(&txn);
        let roles = RoleGrantEngine::new(self.catalog, &store);
        if plan == RemovalPlan::RemoveOrganizerAndMember {
            roles
                .revoke_role(user_id, MEETUP_LOCATION_ORGANIZER, target)
                .await?;
        }
        roles
            .revoke_role(user_id, MEETUP_LOCATION_MEMBER, target)
            .await?;
        txn.commit().await?;

        info!(location_id, user_id, ?plan, dropped_requests = dropped, removed_by = caller.user_id, "Location member removed");
        Ok(Outcome::ok(
            messages::member_removed(&user.username, &what),
            removed,
        ))
    }

    /// Make a member an organizer. Promoting an organizer again changes nothing.
    pub async fn promote_organizer(
        &self,
        caller: &AuthUser,
        location_id: i32,
        user_id: i32,
    ) -> Result<Outcome<location_member::Model>, AppError> {
        let target = ObjectRef::meetup_location(location_id);
        let txn = self.db.begin().await?;
        let location = lock_location(&txn, location_id).await?;
        require_capability(&txn, caller, capability::ADD_LOCATION_ORGANIZER, target).await?;
        let user = find_user(&txn, user_id).await?;
        let what = describe_location(&location);

        let standing = location_standing(&txn, location_id, user_id).await?;
        match plan_promotion(standing) {
            PromotionPlan::NotAMember => {
                return Ok(Outcome::refused(
                    WorkflowStatus::NotAMember,
                    messages::not_a_member(&user.username, &what),
                ));
            }
            PromotionPlan::AlreadyOrganizer => {
                let member = upsert_location_member(&txn, location_id, user_id, true).await?;
                return Ok(Outcome::ok(
                    messages::already_organizer(&user.username, &what),
                    member,
                ));
            }
            PromotionPlan::Promote => {}
        }

        let member = upsert_location_member(&txn, location_id, user_id, true).await?;
        let store = DbPermissionStore::new(&txn);
        RoleGrantEngine::new(self.catalog, &store)
            .grant_role(user_id, MEETUP_LOCATION_ORGANIZER, target)
            .await?;
        if let Some(pending) =
            find_pending_request(&txn, RequestKind::LocationUpgrade, location_id, user_id).await?
        {
            settle_request(&txn, pending, caller.user_id).await?;
        }
        txn.commit().await?;

        info!(location_id, user_id, promoted_by = caller.user_id, "Organizer promoted");
        let message = messages::organizer_added(&user.username, &what);
        self.notify(Notice::new(
            NoticeKind::OrganizerPromoted,
            vec![user_id],
            message.clone(),
        ))
        .await;

        Ok(Outcome::ok(message, member))
    }

    /// Take organizer status away, keeping the membership. The last organizer stays.
    pub async fn demote_organizer(
        &self,
        caller: &AuthUser,
        location_id: i32,
        user_id: i32,
    ) -> Result<Outcome<location_member::Model>, AppError> {
        let target = ObjectRef::meetup_location(location_id);
        let txn = self.db.begin().await?;
        let location = lock_location(&txn, location_id).await?;
        require_capability(&txn, caller, capability::DELETE_LOCATION_ORGANIZER, target).await?;
        let user = find_user(&txn, user_id).await?;
        let what = describe_location(&location);

        let standing = location_standing(&txn, location_id, user_id).await?;
        let organizers = organizer_count(&txn, location_id).await?;
        match plan_demotion(standing, organizers) {
            DemotionPlan::SoleOrganizer => {
                return Ok(Outcome::refused(
                    WorkflowStatus::SoleOrganizer,
                    messages::sole_organizer(&user.username, &what),
                ));
            }
            DemotionPlan::NotOrganizer if !standing.is_member() => {
                return Ok(Outcome::refused(
                    WorkflowStatus::NotAMember,
                    messages::not_a_member(&user.username, &what),
                ));
            }
            DemotionPlan::NotOrganizer => {
                let member = location_member::Entity::find_by_id((location_id, user_id))
                    .one(&txn)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Membership not found".into()))?;
                return Ok(Outcome::ok(
                    messages::not_organizer(&user.username, &what),
                    member,
                ));
            }
            DemotionPlan::Demote => {}
        }

        let existing = location_member::Entity::find_by_id((location_id, user_id))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Membership not found".into()))?;
        let mut active: location_member::ActiveModel = existing.into();
        active.is_organizer = Set(false);
        let member = active.update(&txn).await?;

        let store = DbPermissionStore::new(&txn);
        RoleGrantEngine::new(self.catalog, &store)
            .revoke_role(user_id, MEETUP_LOCATION_ORGANIZER, target)
            .await?;
        txn.commit().await?;

        info!(location_id, user_id, demoted_by = caller.user_id, "Organizer demoted");
        Ok(Outcome::ok(
            messages::organizer_removed(&user.username, &what),
            member,
        ))
    }
}
