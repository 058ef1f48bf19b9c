use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::rsvp;

/// Request body for answering whether the caller is coming.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RsvpRequest {
    #[schema(example = true)]
    pub coming: bool,
    /// Bringing one guest. Ignored when not coming.
    #[serde(default)]
    pub plus_one: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RsvpResponse {
    pub meetup_id: i32,
    pub user_id: i32,
    pub coming: bool,
    pub plus_one: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<rsvp::Model> for RsvpResponse {
    fn from(m: rsvp::Model) -> Self {
        Self {
            meetup_id: m.meetup_id,
            user_id: m.user_id,
            coming: m.coming,
            plus_one: m.plus_one,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AttendeeResponse {
    pub user_id: i32,
    pub username: String,
    pub plus_one: bool,
}

/// Head counts and the list of people coming.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RsvpSummaryResponse {
    /// People coming, guests included.
    #[schema(example = 12)]
    pub coming: u64,
    #[schema(example = 3)]
    pub not_coming: u64,
    pub going: Vec<AttendeeResponse>,
}

/// `(coming, not_coming)` over a meetup's answers. Each plus-one adds a head.
pub fn head_count(rows: &[rsvp::Model]) -> (u64, u64) {
    rows.iter().fold((0, 0), |(yes, no), r| match (r.coming, r.plus_one) {
        (true, true) => (yes + 2, no),
        (true, false) => (yes + 1, no),
        (false, _) => (yes, no + 1),
    })
}
