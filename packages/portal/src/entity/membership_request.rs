use common::{RequestKind, RequestStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A pending ask to join a community or meetup location, or to organize one.
///
/// `target_id` points at a community for `CommunityJoin` and at a meetup location
/// otherwise. At most one pending row exists per (kind, target, requester); see
/// `seed::ensure_indexes`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "membership_request")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub kind: RequestKind,
    pub target_id: i32,
    pub requester_id: i32,
    pub status: RequestStatus,
    pub decided_by: Option<i32>,
    pub decided_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
