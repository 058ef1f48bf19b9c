use common::RequestStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A member volunteering to help run a meetup.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "support_request")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub meetup_id: i32,
    #[sea_orm(belongs_to, from = "meetup_id", to = "id")]
    pub meetup: HasOne<super::meetup::Entity>,

    pub volunteer_id: i32,
    pub description: String,
    pub status: RequestStatus,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
