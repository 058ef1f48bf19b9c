use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "meetup_location")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub description: String,

    #[sea_orm(has_many)]
    pub members: HasMany<super::location_member::Entity>,

    #[sea_orm(has_many)]
    pub meetups: HasMany<super::meetup::Entity>,

    #[sea_orm(has_many)]
    pub meetup_requests: HasMany<super::meetup_request::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
