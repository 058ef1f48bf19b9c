use common::CommentTarget;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A comment on a meetup or on a support request.
///
/// `target_id` points at `meetup.id` or `support_request.id` depending on `target`,
/// so there is no foreign key on it.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub target: CommentTarget,
    pub target_id: i32,

    pub author_id: i32,
    #[sea_orm(belongs_to, from = "author_id", to = "id")]
    pub author: HasOne<super::user::Entity>,

    pub body: String,

    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}
