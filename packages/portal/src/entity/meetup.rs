use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "meetup")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    /// Unique across every location.
    #[sea_orm(unique)]
    pub slug: String,
    pub date: Date,
    pub time: Time,
    pub venue: String,
    pub description: String, // in Markdown

    pub location_id: i32,
    #[sea_orm(belongs_to, from = "location_id", to = "id")]
    pub location: HasOne<super::meetup_location::Entity>,

    #[sea_orm(has_many)]
    pub support_requests: HasMany<super::support_request::Entity>,

    #[sea_orm(has_many)]
    pub rsvps: HasMany<super::rsvp::Entity>,

    pub created_by: i32,
    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
