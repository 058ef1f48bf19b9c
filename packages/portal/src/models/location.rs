use chrono::{DateTime, Utc};
use common::{RequestKind, RequestStatus};
use serde::{Deserialize, Serialize};

use super::shared::{Pagination, validate_name, validate_slug};
use crate::error::AppError;

/// Request body for creating a meetup location.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateLocationRequest {
    #[schema(example = "Boston")]
    pub name: String,
    #[schema(example = "boston")]
    pub slug: String,
    #[serde(default)]
    pub description: String,
}

pub fn validate_create_location(payload: &CreateLocationRequest) -> Result<(), AppError> {
    validate_name(&payload.name)?;
    validate_slug(payload.slug.trim())
}

/// Partial update of a meetup location. The slug is fixed once created.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateLocationRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

pub fn validate_update_location(payload: &UpdateLocationRequest) -> Result<(), AppError> {
    if let Some(ref name) = payload.name {
        validate_name(name)?;
    }
    Ok(())
}

/// Names the user a member or organizer action applies to.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct MemberRequest {
    #[schema(example = 42)]
    pub user_id: i32,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LocationResponse {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::meetup_location::Model> for LocationResponse {
    fn from(m: crate::entity::meetup_location::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            slug: m.slug,
            description: m.description,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LocationListResponse {
    pub data: Vec<LocationResponse>,
    pub pagination: Pagination,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LocationMemberResponse {
    pub location_id: i32,
    pub user_id: i32,
    pub username: String,
    pub is_organizer: bool,
    pub joined_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MembershipResponse {
    pub location_id: i32,
    pub user_id: i32,
    pub is_organizer: bool,
    pub joined_at: DateTime<Utc>,
}

impl From<crate::entity::location_member::Model> for MembershipResponse {
    fn from(m: crate::entity::location_member::Model) -> Self {
        Self {
            location_id: m.location_id,
            user_id: m.user_id,
            is_organizer: m.is_organizer,
            joined_at: m.joined_at,
        }
    }
}

/// A join or organizer-upgrade request, for communities and locations alike.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MembershipRequestResponse {
    pub id: i32,
    pub kind: RequestKind,
    /// Community id for `community_join`, meetup location id otherwise.
    pub target_id: i32,
    pub requester_id: i32,
    pub status: RequestStatus,
    pub decided_by: Option<i32>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::membership_request::Model> for MembershipRequestResponse {
    fn from(m: crate::entity::membership_request::Model) -> Self {
        Self {
            id: m.id,
            kind: m.kind,
            target_id: m.target_id,
            requester_id: m.requester_id,
            status: m.status,
            decided_by: m.decided_by,
            decided_at: m.decided_at,
            created_at: m.created_at,
        }
    }
}
