use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A user's answer to whether they are coming to a meetup. One row per user and meetup.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rsvp")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub meetup_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i32,
    #[sea_orm(belongs_to, from = "meetup_id", to = "id")]
    pub meetup: HasOne<super::meetup::Entity>,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    pub coming: bool,
    /// Bringing one guest along. Only counted when `coming` is set.
    pub plus_one: bool,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
