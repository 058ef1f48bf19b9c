use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A capability held by a user on one community or meetup location.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "object_permission")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub capability: String,
    /// `community` or `meetup_location`.
    #[sea_orm(primary_key, auto_increment = false)]
    pub target_kind: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub target_id: i32,

    pub granted_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
