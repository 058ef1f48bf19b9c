use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per member of a meetup location. Organizers are members with the flag set.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "location_member")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub location_id: i32,
    #[sea_orm(primary_key)]
    pub user_id: i32,
    #[sea_orm(belongs_to, from = "location_id", to = "id")]
    pub location: HasOne<super::meetup_location::Entity>,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    pub is_organizer: bool,
    pub joined_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
