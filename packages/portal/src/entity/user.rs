use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    /// Site administrators pass every object-level capability check.
    pub is_superuser: bool,

    #[sea_orm(has_many)]
    pub communities: HasMany<super::community_member::Entity>,

    #[sea_orm(has_many)]
    pub locations: HasMany<super::location_member::Entity>,

    #[sea_orm(has_many)]
    pub rsvps: HasMany<super::rsvp::Entity>,

    #[sea_orm(has_many)]
    pub comments: HasMany<super::comment::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
