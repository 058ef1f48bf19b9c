use chrono::Utc;
use common::ObjectRef;
use common::permission::capability;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait};
use tracing::info;

use super::Workflow;
use crate::entity::{rsvp, user};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::rsvp::RsvpRequest;
use crate::utils::access::{find_location, find_meetup, require_capability};

impl Workflow<'_> {
    /// Record whether the caller is coming, replacing any earlier answer.
    ///
    /// Requires `add_meetup_rsvp` on the meetup's location.
    pub async fn rsvp(
        &self,
        caller: &AuthUser,
        location_id: i32,
        meetup_id: i32,
        payload: RsvpRequest,
    ) -> Result<rsvp::Model, AppError> {
        let target = ObjectRef::meetup_location(location_id);
        let txn = self.db.begin().await?;
        find_location(&txn, location_id).await?;
        find_meetup(&txn, location_id, meetup_id).await?;
        require_capability(&txn, caller, capability::ADD_MEETUP_RSVP, target).await?;

        let now = Utc::now();
        let answer = rsvp::ActiveModel {
            meetup_id: Set(meetup_id),
            user_id: Set(caller.user_id),
            coming: Set(payload.coming),
            plus_one: Set(payload.coming && payload.plus_one),
            created_at: Set(now),
            updated_at: Set(now),
        };
        rsvp::Entity::insert(answer)
            .on_conflict(
                OnConflict::columns([rsvp::Column::MeetupId, rsvp::Column::UserId])
                    .update_columns([
                        rsvp::Column::Coming,
                        rsvp::Column::PlusOne,
                        rsvp::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;
        let answer = rsvp::Entity::find_by_id((meetup_id, caller.user_id))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::Internal("RSVP missing after upsert".into()))?;
        txn.commit().await?;

        info!(meetup_id, user_id = caller.user_id, coming = answer.coming, plus_one = answer.plus_one, "RSVP recorded");
        Ok(answer)
    }

    /// Every answer for a meetup with the user who gave it, oldest first.
    pub async fn rsvps(
        &self,
        location_id: i32,
        meetup_id: i32,
    ) -> Result<Vec<(rsvp::Model, Option<user::Model>)>, AppError> {
        find_location(self.db, location_id).await?;
        find_meetup(self.db, location_id, meetup_id).await?;

        let rows = rsvp::Entity::find()
            .filter(rsvp::Column::MeetupId.eq(meetup_id))
            .find_also_related(user::Entity)
            .order_by_asc(rsvp::Column::CreatedAt)
            .all(self.db)
            .await?;
        Ok(rows)
    }
}
