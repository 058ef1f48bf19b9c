use chrono::{DateTime, Utc};
use common::CommentTarget;
use serde::{Deserialize, Serialize};

use crate::entity::comment;
use crate::error::AppError;

/// Request body for adding or editing a comment.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CommentRequest {
    /// Markdown body.
    #[schema(example = "I can bring the projector.")]
    pub body: String,
}

pub fn validate_comment(payload: &CommentRequest) -> Result<(), AppError> {
    let len = payload.body.trim().chars().count();
    if len == 0 || len > 4096 {
        return Err(AppError::Validation(
            "Comment must be 1-4096 characters".into(),
        ));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CommentResponse {
    pub id: i32,
    pub target: CommentTarget,
    pub target_id: i32,
    pub author_id: i32,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CommentResponse {
    pub fn new(m: comment::Model, author: String) -> Self {
        Self {
            id: m.id,
            target: m.target,
            target_id: m.target_id,
            author_id: m.author_id,
            author,
            body: m.body,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
