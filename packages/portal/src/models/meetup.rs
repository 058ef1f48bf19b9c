use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use common::RequestStatus;
use serde::{Deserialize, Serialize};

use super::shared::{validate_slug, validate_title};
use crate::error::AppError;

/// Request body for proposing a new meetup at a location.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ProposeMeetupRequest {
    #[schema(example = "FOSS Night")]
    pub title: String,
    #[schema(example = "foss-night")]
    pub slug: String,
    #[schema(example = "2026-11-05")]
    pub date: NaiveDate,
    #[schema(example = "18:30:00")]
    pub time: NaiveTime,
    #[serde(default)]
    pub venue: String,
    /// Markdown description.
    #[serde(default)]
    pub description: String,
}

pub fn validate_propose_meetup(payload: &ProposeMeetupRequest) -> Result<(), AppError> {
    validate_title(&payload.title)?;
    validate_slug(payload.slug.trim())?;
    if payload.venue.chars().count() > 512 {
        return Err(AppError::Validation(
            "Venue must be at most 512 characters".into(),
        ));
    }
    Ok(())
}

/// Partial update of a meetup. Absent fields are left as they are.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateMeetupRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub venue: Option<String>,
    pub description: Option<String>,
}

pub fn validate_update_meetup(payload: &UpdateMeetupRequest) -> Result<(), AppError> {
    if let Some(ref title) = payload.title {
        validate_title(title)?;
    }
    if let Some(ref slug) = payload.slug {
        validate_slug(slug.trim())?;
    }
    if let Some(ref venue) = payload.venue
        && venue.chars().count() > 512
    {
        return Err(AppError::Validation(
            "Venue must be at most 512 characters".into(),
        ));
    }
    Ok(())
}

/// Which side of today a meetup list covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MeetupWhen {
    /// Today and later.
    Upcoming,
    /// Before today.
    Past,
}

/// `?when=upcoming|past` for the meetup list. Without it every meetup is listed.
#[derive(Deserialize, Default, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MeetupListQuery {
    pub when: Option<MeetupWhen>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MeetupRequestResponse {
    pub id: i32,
    pub location_id: i32,
    pub title: String,
    pub slug: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub venue: String,
    pub description: String,
    pub created_by: i32,
    pub status: RequestStatus,
    pub approved_by: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::meetup_request::Model> for MeetupRequestResponse {
    fn from(m: crate::entity::meetup_request::Model) -> Self {
        Self {
            id: m.id,
            location_id: m.location_id,
            title: m.title,
            slug: m.slug,
            date: m.date,
            time: m.time,
            venue: m.venue,
            description: m.description,
            created_by: m.created_by,
            status: m.status,
            approved_by: m.approved_by,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MeetupResponse {
    pub id: i32,
    pub location_id: i32,
    pub title: String,
    pub slug: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub venue: String,
    pub description: String,
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::meetup::Model> for MeetupResponse {
    fn from(m: crate::entity::meetup::Model) -> Self {
        Self {
            id: m.id,
            location_id: m.location_id,
            title: m.title,
            slug: m.slug,
            date: m.date,
            time: m.time,
            venue: m.venue,
            description: m.description,
            created_by: m.created_by,
            created_at: m.created_at,
        }
    }
}
