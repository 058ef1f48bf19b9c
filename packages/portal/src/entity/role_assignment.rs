use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A role template a user currently holds on one object.
///
/// Kept next to `object_permission` so revoking one role can tell which
/// capabilities are still owed to the others.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "role_assignment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub role_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub target_kind: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub target_id: i32,

    pub assigned_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
