use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;

use super::created_or_ok;
use crate::entity::meetup;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::meetup::*;
use crate::state::AppState;
use crate::utils::access::{find_location, find_meetup};
use crate::workflow::{Outcome, Workflow};

#[utoipa::path(
    get,
    path = "/{id}/meetups",
    tag = "Meetups",
    operation_id = "listMeetups",
    summary = "List meetups at a location",
    description = "`when=upcoming` keeps meetups dated today or later, `when=past` those before today.",
    params(("id" = i32, Path, description = "Meetup location ID"), MeetupListQuery),
    responses(
        (status = 200, description = "Meetups by date", body = Vec<MeetupResponse>),
        (status = 400, description = "Unknown `when` value"),
        (status = 404, description = "Location not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_meetups(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<MeetupListQuery>,
) -> Result<Json<Vec<MeetupResponse>>, AppError> {
    find_location(&state.db, id).await?;

    let mut select = meetup::Entity::find().filter(meetup::Column::LocationId.eq(id));
    let today = Utc::now().date_naive();
    match query.when {
        Some(MeetupWhen::Upcoming) => select = select.filter(meetup::Column::Date.gte(today)),
        Some(MeetupWhen::Past) => select = select.filter(meetup::Column::Date.lt(today)),
        None => {}
    }

    let meetups = select
        .order_by_asc(meetup::Column::Date)
        .order_by_asc(meetup::Column::Time)
        .all(&state.db)
        .await?;
    Ok(Json(meetups.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/{id}/meetups",
    tag = "Meetups",
    operation_id = "createMeetup",
    summary = "Create a meetup directly",
    description = "Site administrators only. Takes the same body as a proposal and skips review.",
    params(("id" = i32, Path, description = "Meetup location ID")),
    request_body = ProposeMeetupRequest,
    responses(
        (status = 201, description = "Meetup created", body = MeetupResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Location not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Slug taken (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(slug = %payload.slug))]
pub async fn create_meetup(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<ProposeMeetupRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_propose_meetup(&payload)?;
    let model = Workflow::new(&state)
        .create_meetup(&auth_user, id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(MeetupResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/{id}/meetups/{meetup_id}",
    tag = "Meetups",
    operation_id = "getMeetup",
    summary = "Get a meetup",
    params(
        ("id" = i32, Path, description = "Meetup location ID"),
        ("meetup_id" = i32, Path, description = "Meetup ID"),
    ),
    responses(
        (status = 200, description = "Meetup details", body = MeetupResponse),
        (status = 404, description = "Location or meetup not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_meetup(
    State(state): State<AppState>,
    Path((id, meetup_id)): Path<(i32, i32)>,
) -> Result<Json<MeetupResponse>, AppError> {
    find_location(&state.db, id).await?;
    Ok(Json(find_meetup(&state.db, id, meetup_id).await?.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}/meetups/{meetup_id}",
    tag = "Meetups",
    operation_id = "updateMeetup",
    summary = "Update a meetup",
    description = "Site administrators only. Only provided fields change. An empty payload returns the meetup unchanged.",
    params(
        ("id" = i32, Path, description = "Meetup location ID"),
        ("meetup_id" = i32, Path, description = "Meetup ID"),
    ),
    request_body = UpdateMeetupRequest,
    responses(
        (status = 200, description = "Meetup updated", body = MeetupResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Meetup not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Slug taken (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_meetup(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, meetup_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<UpdateMeetupRequest>,
) -> Result<Json<MeetupResponse>, AppError> {
    validate_update_meetup(&payload)?;
    let model = Workflow::new(&state)
        .update_meetup(&auth_user, id, meetup_id, payload)
        .await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}/meetups/{meetup_id}",
    tag = "Meetups",
    operation_id = "deleteMeetup",
    summary = "Delete a meetup",
    description = "Site administrators only. Removes its support requests, RSVPs and comments too.",
    params(
        ("id" = i32, Path, description = "Meetup location ID"),
        ("meetup_id" = i32, Path, description = "Meetup ID"),
    ),
    responses(
        (status = 204, description = "Meetup deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Meetup not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_meetup(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, meetup_id)): Path<(i32, i32)>,
) -> Result<StatusCode, AppError> {
    Workflow::new(&state)
        .delete_meetup(&auth_user, id, meetup_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/{id}/meetup-requests",
    tag = "Meetup Requests",
    operation_id = "proposeMeetup",
    summary = "Propose a new meetup",
    description = "Any signed-in user can propose. A pending request with the same slug at this location yields `already_requested`.",
    params(("id" = i32, Path, description = "Meetup location ID")),
    request_body = ProposeMeetupRequest,
    responses(
        (status = 201, description = "Request submitted", body = Outcome<MeetupRequestResponse>),
        (status = 200, description = "`already_requested`", body = Outcome<MeetupRequestResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Location not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(slug = %payload.slug))]
pub async fn propose_meetup(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<ProposeMeetupRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_propose_meetup(&payload)?;
    let outcome = Workflow::new(&state)
        .propose_meetup(&auth_user, id, payload)
        .await?;
    Ok(created_or_ok(outcome.map(MeetupRequestResponse::from)))
}

#[utoipa::path(
    get,
    path = "/{id}/meetup-requests",
    tag = "Meetup Requests",
    operation_id = "listMeetupRequests",
    summary = "List pending meetup requests",
    description = "Requires `view_meetup_location_meetuprequest`.",
    params(("id" = i32, Path, description = "Meetup location ID")),
    responses(
        (status = 200, description = "Pending requests by date", body = Vec<MeetupRequestResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Location not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_meetup_requests(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<MeetupRequestResponse>>, AppError> {
    let requests = Workflow::new(&state)
        .pending_meetup_requests(&auth_user, id)
        .await?;
    Ok(Json(requests.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/{id}/meetup-requests/{request_id}/approve",
    tag = "Meetup Requests",
    operation_id = "approveMeetupRequest",
    summary = "Approve a meetup request",
    description = "Creates the meetup and makes the requester an organizer. A taken slug yields `slug_already_exists` and leaves the request pending. Requires `approve_meetup_location_meetuprequest`.",
    params(
        ("id" = i32, Path, description = "Meetup location ID"),
        ("request_id" = i32, Path, description = "Meetup request ID"),
    ),
    responses(
        (status = 201, description = "Meetup created", body = Outcome<MeetupResponse>),
        (status = 200, description = "`slug_already_exists`", body = Outcome<MeetupResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Location or request not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Request already decided (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn approve_meetup_request(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, request_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = Workflow::new(&state)
        .approve_meetup_request(&auth_user, id, request_id)
        .await?;
    Ok(created_or_ok(outcome.map(MeetupResponse::from)))
}

#[utoipa::path(
    post,
    path = "/{id}/meetup-requests/{request_id}/reject",
    tag = "Meetup Requests",
    operation_id = "rejectMeetupRequest",
    summary = "Reject a meetup request",
    description = "Deletes the request. Requires `reject_meetup_location_meetuprequest`.",
    params(
        ("id" = i32, Path, description = "Meetup location ID"),
        ("request_id" = i32, Path, description = "Meetup request ID"),
    ),
    responses(
        (status = 200, description = "Request rejected", body = Outcome<MeetupRequestResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Location or request not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Request already decided (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn reject_meetup_request(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, request_id)): Path<(i32, i32)>,
) -> Result<Json<Outcome<MeetupRequestResponse>>, AppError> {
    let outcome = Workflow::new(&state)
        .reject_meetup_request(&auth_user, id, request_id)
        .await?;
    Ok(Json(outcome.map(Into::into)))
}
