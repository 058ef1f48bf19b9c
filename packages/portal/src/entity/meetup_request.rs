use common::RequestStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A proposed meetup awaiting an organizer's decision.
///
/// The slug is unique only among pending requests at one location. Collisions
/// with existing meetups are checked on approval.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "meetup_request")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    pub slug: String,
    pub date: Date,
    pub time: Time,
    pub venue: String,
    pub description: String,

    pub location_id: i32,
    #[sea_orm(belongs_to, from = "location_id", to = "id")]
    pub location: HasOne<super::meetup_location::Entity>,

    pub created_by: i32,
    pub status: RequestStatus,
    pub approved_by: Option<i32>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
