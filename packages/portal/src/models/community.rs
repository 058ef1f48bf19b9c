use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{Pagination, validate_name, validate_slug};
use crate::error::AppError;

/// Request body for creating a community.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCommunityRequest {
    #[schema(example = "Systers Open Source")]
    pub name: String,
    #[schema(example = "systers-open-source")]
    pub slug: String,
    /// Markdown description.
    #[serde(default)]
    pub description: String,
}

pub fn validate_create_community(payload: &CreateCommunityRequest) -> Result<(), AppError> {
    validate_name(&payload.name)?;
    validate_slug(payload.slug.trim())
}

/// Request body for granting or revoking a community role.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CommunityRoleRequest {
    #[schema(example = 42)]
    pub user_id: i32,
    /// Role id, e.g. `community_moderator` or `community_leader`.
    #[schema(example = "community_moderator")]
    pub role: String,
}

pub fn validate_role_request(payload: &CommunityRoleRequest) -> Result<(), AppError> {
    if payload.role.trim().is_empty() {
        return Err(AppError::Validation("Role must not be empty".into()));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CommunityResponse {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::community::Model> for CommunityResponse {
    fn from(m: crate::entity::community::Model) -> Self {
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
pub struct CommunityListResponse {
    pub data: Vec<CommunityResponse>,
    pub pagination: Pagination,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CommunityMemberResponse {
    pub user_id: i32,
    pub username: String,
    /// Community roles held, e.g. `community_leader`.
    pub roles: Vec<String>,
    pub joined_at: DateTime<Utc>,
}

/// A role held by a user on a community.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RoleAssignmentResponse {
    pub user_id: i32,
    pub role: String,
    /// Display label, e.g. `Systers Open Source: Community Leader`.
    pub label: String,
}

impl From<crate::workflow::RoleChange> for RoleAssignmentResponse {
    fn from(c: crate::workflow::RoleChange) -> Self {
        Self {
            user_id: c.user_id,
            role: c.role,
            label: c.label,
        }
    }
}
