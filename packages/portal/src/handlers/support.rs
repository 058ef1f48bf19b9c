use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::RequestStatus;
use sea_orm::*;
use tracing::instrument;

use super::created_or_ok;
use crate::entity::support_request;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::support::*;
use crate::state::AppState;
use crate::utils::access::{find_location, find_meetup};
use crate::workflow::{Outcome, Workflow};

#[utoipa::path(
    get,
    path = "/{id}/meetups/{meetup_id}/volunteers",
    tag = "Support Requests",
    operation_id = "listVolunteers",
    summary = "List accepted support requests",
    params(
        ("id" = i32, Path, description = "Meetup location ID"),
        ("meetup_id" = i32, Path, description = "Meetup ID"),
    ),
    responses(
        (status = 200, description = "Approved requests, oldest first", body = Vec<SupportRequestResponse>),
        (status = 404, description = "Location or meetup not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_volunteers(
    State(state): State<AppState>,
    Path((id, meetup_id)): Path<(i32, i32)>,
) -> Result<Json<Vec<SupportRequestResponse>>, AppError> {
    find_location(&state.db, id).await?;
    find_meetup(&state.db, id, meetup_id).await?;
    let requests = support_request::Entity::find()
        .filter(support_request::Column::MeetupId.eq(meetup_id))
        .filter(support_request::Column::Status.eq(RequestStatus::Approved))
        .order_by_asc(support_request::Column::CreatedAt)
        .all(&state.db)
        .await?;
    Ok(Json(requests.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/{id}/meetups/{meetup_id}/support-requests",
    tag = "Support Requests",
    operation_id = "volunteer",
    summary = "Volunteer to help at a meetup",
    description = "Requires `add_support_request`, held by every location member.",
    params(
        ("id" = i32, Path, description = "Meetup location ID"),
        ("meetup_id" = i32, Path, description = "Meetup ID"),
    ),
    request_body = CreateSupportRequest,
    responses(
        (status = 201, description = "Request submitted", body = Outcome<SupportRequestResponse>),
        (status = 200, description = "`already_requested`", body = Outcome<SupportRequestResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Location or meetup not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn volunteer(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, meetup_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<CreateSupportRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_support_request(&payload)?;
    let outcome = Workflow::new(&state)
        .volunteer(&auth_user, id, meetup_id, payload)
        .await?;
    Ok(created_or_ok(outcome.map(SupportRequestResponse::from)))
}

#[utoipa::path(
    get,
    path = "/{id}/meetups/{meetup_id}/support-requests",
    tag = "Support Requests",
    operation_id = "listSupportRequests",
    summary = "List pending support requests",
    description = "Requires `approve_support_request`.",
    params(
        ("id" = i32, Path, description = "Meetup location ID"),
        ("meetup_id" = i32, Path, description = "Meetup ID"),
    ),
    responses(
        (status = 200, description = "Pending requests", body = Vec<SupportRequestResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Location or meetup not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_support_requests(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, meetup_id)): Path<(i32, i32)>,
) -> Result<Json<Vec<SupportRequestResponse>>, AppError> {
    let requests = Workflow::new(&state)
        .pending_support_requests(&auth_user, id, meetup_id)
        .await?;
    Ok(Json(requests.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/{id}/meetups/{meetup_id}/support-requests/{request_id}/approve",
    tag = "Support Requests",
    operation_id = "approveSupportRequest",
    summary = "Approve a support request",
    description = "Requires `approve_support_request`.",
    params(
        ("id" = i32, Path, description = "Meetup location ID"),
        ("meetup_id" = i32, Path, description = "Meetup ID"),
        ("request_id" = i32, Path, description = "Support request ID"),
    ),
    responses(
        (status = 200, description = "Request approved", body = Outcome<SupportRequestResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Request already decided (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn approve_support_request(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, meetup_id, request_id)): Path<(i32, i32, i32)>,
) -> Result<Json<Outcome<SupportRequestResponse>>, AppError> {
    let outcome = Workflow::new(&state)
        .approve_support_request(&auth_user, id, meetup_id, request_id)
        .await?;
    Ok(Json(outcome.map(Into::into)))
}

#[utoipa::path(
    post,
    path = "/{id}/meetups/{meetup_id}/support-requests/{request_id}/reject",
    tag = "Support Requests",
    operation_id = "rejectSupportRequest",
    summary = "Reject a support request",
    description = "Deletes the request. Requires `reject_support_request`.",
    params(
        ("id" = i32, Path, description = "Meetup location ID"),
        ("meetup_id" = i32, Path, description = "Meetup ID"),
        ("request_id" = i32, Path, description = "Support request ID"),
    ),
    responses(
        (status = 200, description = "Request rejected", body = Outcome<SupportRequestResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Request already decided (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn reject_support_request(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, meetup_id, request_id)): Path<(i32, i32, i32)>,
) -> Result<Json<Outcome<SupportRequestResponse>>, AppError> {
    let outcome = Workflow::new(&state)
        .reject_support_request(&auth_user, id, meetup_id, request_id)
        .await?;
    Ok(Json(outcome.map(Into::into)))
}

#[utoipa::path(
    patch,
    path = "/{id}/meetups/{meetup_id}/support-requests/{request_id}",
    tag = "Support Requests",
    operation_id = "updateSupportRequest",
    summary = "Edit a support request",
    description = "The volunteer or a site administrator only. An empty payload returns the request unchanged.",
    params(
        ("id" = i32, Path, description = "Meetup location ID"),
        ("meetup_id" = i32, Path, description = "Meetup ID"),
        ("request_id" = i32, Path, description = "Support request ID"),
    ),
    request_body = UpdateSupportRequest,
    responses(
        (status = 200, description = "Request updated", body = SupportRequestResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_support_request(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, meetup_id, request_id)): Path<(i32, i32, i32)>,
    AppJson(payload): AppJson<UpdateSupportRequest>,
) -> Result<Json<SupportRequestResponse>, AppError> {
    validate_update_support_request(&payload)?;
    let request = Workflow::new(&state)
        .update_support_request(&auth_user, id, meetup_id, request_id, payload)
        .await?;
    Ok(Json(request.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}/meetups/{meetup_id}/support-requests/{request_id}",
    tag = "Support Requests",
    operation_id = "deleteSupportRequest",
    summary = "Withdraw a support request",
    description = "The volunteer or a site administrator only. Works in any status and removes the request's comments.",
    params(
        ("id" = i32, Path, description = "Meetup location ID"),
        ("meetup_id" = i32, Path, description = "Meetup ID"),
        ("request_id" = i32, Path, description = "Support request ID"),
    ),
    responses(
        (status = 204, description = "Request deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_support_request(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, meetup_id, request_id)): Path<(i32, i32, i32)>,
) -> Result<StatusCode, AppError> {
    Workflow::new(&state)
        .delete_support_request(&auth_user, id, meetup_id, request_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
