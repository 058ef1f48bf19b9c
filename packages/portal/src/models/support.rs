use chrono::{DateTime, Utc};
use common::RequestStatus;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Request body for volunteering at a meetup.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateSupportRequest {
    /// What the volunteer offers to help with.
    #[schema(example = "I can run the registration desk.")]
    pub description: String,
}

pub fn validate_support_request(payload: &CreateSupportRequest) -> Result<(), AppError> {
    validate_description(&payload.description)
}

/// Partial update of a support request.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateSupportRequest {
    pub description: Option<String>,
}

pub fn validate_update_support_request(payload: &UpdateSupportRequest) -> Result<(), AppError> {
    match payload.description {
        Some(ref description) => validate_description(description),
        None => Ok(()),
    }
}

fn validate_description(description: &str) -> Result<(), AppError> {
    let len = description.trim().chars().count();
    if len == 0 || len > 4096 {
        return Err(AppError::Validation(
            "Description must be 1-4096 characters".into(),
        ));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SupportRequestResponse {
    pub id: i32,
    pub meetup_id: i32,
    pub volunteer_id: i32,
    pub description: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::support_request::Model> for SupportRequestResponse {
    fn from(m: crate::entity::support_request::Model) -> Self {
        Self {
            id: m.id,
            meetup_id: m.meetup_id,
            volunteer_id: m.volunteer_id,
            description: m.description,
            status: m.status,
            created_at: m.created_at,
        }
    }
}
