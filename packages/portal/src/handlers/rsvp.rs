use axum::Json;
use axum::extract::{Path, State};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::rsvp::*;
use crate::state::AppState;
use crate::workflow::Workflow;

#[utoipa::path(
    post,
    path = "/{id}/meetups/{meetup_id}/rsvps",
    tag = "RSVPs",
    operation_id = "rsvp",
    summary = "Say whether you are coming",
    description = "Requires `add_meetup_rsvp`, held by every location member. Answering again replaces the earlier answer.",
    params(
        ("id" = i32, Path, description = "Meetup location ID"),
        ("meetup_id" = i32, Path, description = "Meetup ID"),
    ),
    request_body = RsvpRequest,
    responses(
        (status = 200, description = "Answer recorded", body = RsvpResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Location or meetup not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, coming = payload.coming))]
pub async fn rsvp(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, meetup_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<RsvpRequest>,
) -> Result<Json<RsvpResponse>, AppError> {
    let answer = Workflow::new(&state)
        .rsvp(&auth_user, id, meetup_id, payload)
        .await?;
    Ok(Json(answer.into()))
}

#[utoipa::path(
    get,
    path = "/{id}/meetups/{meetup_id}/rsvps",
    tag = "RSVPs",
    operation_id = "listRsvps",
    summary = "Head counts and who is going",
    params(
        ("id" = i32, Path, description = "Meetup location ID"),
        ("meetup_id" = i32, Path, description = "Meetup ID"),
    ),
    responses(
        (status = 200, description = "Counts and attendees", body = RsvpSummaryResponse),
        (status = 404, description = "Location or meetup not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_rsvps(
    State(state): State<AppState>,
    Path((id, meetup_id)): Path<(i32, i32)>,
) -> Result<Json<RsvpSummaryResponse>, AppError> {
    let rows = Workflow::new(&state).rsvps(id, meetup_id).await?;

    let answers: Vec<_> = rows.iter().map(|(r, _)| r.clone()).collect();
    let (coming, not_coming) = head_count(&answers);
    let going = rows
        .into_iter()
        .filter(|(r, _)| r.coming)
        .map(|(r, usr)| AttendeeResponse {
            user_id: r.user_id,
            username: usr.map(|u| u.username).unwrap_or_default(),
            plus_one: r.plus_one,
        })
        .collect();

    Ok(Json(RsvpSummaryResponse {
        coming,
        not_coming,
        going,
    }))
}
