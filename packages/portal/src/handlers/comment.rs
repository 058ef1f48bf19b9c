use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::entity::{comment, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::comment::*;
use crate::state::AppState;
use crate::workflow::{CommentOn, Workflow};

fn with_authors(rows: Vec<(comment::Model, Option<user::Model>)>) -> Vec<CommentResponse> {
    rows.into_iter()
        .map(|(c, usr)| CommentResponse::new(c, usr.map(|u| u.username).unwrap_or_default()))
        .collect()
}

async fn add(
    state: &AppState,
    auth_user: AuthUser,
    on: CommentOn,
    payload: CommentRequest,
) -> Result<(StatusCode, Json<CommentResponse>), AppError> {
    validate_comment(&payload)?;
    let model = Workflow::new(state)
        .add_comment(&auth_user, on, payload)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CommentResponse::new(model, auth_user.username)),
    ))
}

async fn edit(
    state: &AppState,
    auth_user: AuthUser,
    on: CommentOn,
    comment_id: i32,
    payload: CommentRequest,
) -> Result<Json<CommentResponse>, AppError> {
    validate_comment(&payload)?;
    let model = Workflow::new(state)
        .edit_comment(&auth_user, on, comment_id, payload)
        .await?;
    Ok(Json(CommentResponse::new(model, auth_user.username)))
}

#[utoipa::path(
    get,
    path = "/{id}/meetups/{meetup_id}/comments",
    tag = "Comments",
    operation_id = "listMeetupComments",
    summary = "List comments on a meetup",
    params(
        ("id" = i32, Path, description = "Meetup location ID"),
        ("meetup_id" = i32, Path, description = "Meetup ID"),
    ),
    responses(
        (status = 200, description = "Comments in posting order", body = Vec<CommentResponse>),
        (status = 404, description = "Location or meetup not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_meetup_comments(
    State(state): State<AppState>,
    Path((id, meetup_id)): Path<(i32, i32)>,
) -> Result<Json<Vec<CommentResponse>>, AppError> {
    let on = CommentOn::Meetup {
        location_id: id,
        meetup_id,
    };
    let rows = Workflow::new(&state).comments(on).await?;
    Ok(Json(with_authors(rows)))
}

#[utoipa::path(
    post,
    path = "/{id}/meetups/{meetup_id}/comments",
    tag = "Comments",
    operation_id = "addMeetupComment",
    summary = "Comment on a meetup",
    description = "Any signed-in user may comment on a meetup.",
    params(
        ("id" = i32, Path, description = "Meetup location ID"),
        ("meetup_id" = i32, Path, description = "Meetup ID"),
    ),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment added", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Location or meetup not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn add_meetup_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, meetup_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<CommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let on = CommentOn::Meetup {
        location_id: id,
        meetup_id,
    };
    add(&state, auth_user, on, payload).await
}

#[utoipa::path(
    patch,
    path = "/{id}/meetups/{meetup_id}/comments/{comment_id}",
    tag = "Comments",
    operation_id = "editMeetupComment",
    summary = "Edit a comment",
    description = "Only the author may edit.",
    params(
        ("id" = i32, Path, description = "Meetup location ID"),
        ("meetup_id" = i32, Path, description = "Meetup ID"),
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn edit_meetup_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, meetup_id, comment_id)): Path<(i32, i32, i32)>,
    AppJson(payload): AppJson<CommentRequest>,
) -> Result<Json<CommentResponse>, AppError> {
    let on = CommentOn::Meetup {
        location_id: id,
        meetup_id,
    };
    edit(&state, auth_user, on, comment_id, payload).await
}

#[utoipa::path(
    delete,
    path = "/{id}/meetups/{meetup_id}/comments/{comment_id}",
    tag = "Comments",
    operation_id = "deleteMeetupComment",
    summary = "Delete a comment",
    description = "The author or a site administrator.",
    params(
        ("id" = i32, Path, description = "Meetup location ID"),
        ("meetup_id" = i32, Path, description = "Meetup ID"),
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_meetup_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, meetup_id, comment_id)): Path<(i32, i32, i32)>,
) -> Result<StatusCode, AppError> {
    let on = CommentOn::Meetup {
        location_id: id,
        meetup_id,
    };
    Workflow::new(&state)
        .delete_comment(&auth_user, on, comment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{id}/meetups/{meetup_id}/support-requests/{request_id}/comments",
    tag = "Comments",
    operation_id = "listSupportRequestComments",
    summary = "List comments on a support request",
    params(
        ("id" = i32, Path, description = "Meetup location ID"),
        ("meetup_id" = i32, Path, description = "Meetup ID"),
        ("request_id" = i32, Path, description = "Support request ID"),
    ),
    responses(
        (status = 200, description = "Comments in posting order", body = Vec<CommentResponse>),
        (status = 404, description = "Location, meetup or support request not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_support_request_comments(
    State(state): State<AppState>,
    Path((id, meetup_id, request_id)): Path<(i32, i32, i32)>,
) -> Result<Json<Vec<CommentResponse>>, AppError> {
    let on = CommentOn::SupportRequest {
        location_id: id,
        meetup_id,
        request_id,
    };
    let rows = Workflow::new(&state).comments(on).await?;
    Ok(Json(with_authors(rows)))
}

#[utoipa::path(
    post,
    path = "/{id}/meetups/{meetup_id}/support-requests/{request_id}/comments",
    tag = "Comments",
    operation_id = "addSupportRequestComment",
    summary = "Comment on a support request",
    description = "Requires `add_support_request_comment`, held by every location member.",
    params(
        ("id" = i32, Path, description = "Meetup location ID"),
        ("meetup_id" = i32, Path, description = "Meetup ID"),
        ("request_id" = i32, Path, description = "Support request ID"),
    ),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment added", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Location, meetup or support request not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn add_support_request_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, meetup_id, request_id)): Path<(i32, i32, i32)>,
    AppJson(payload): AppJson<CommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let on = CommentOn::SupportRequest {
        location_id: id,
        meetup_id,
        request_id,
    };
    add(&state, auth_user, on, payload).await
}

#[utoipa::path(
    patch,
    path = "/{id}/meetups/{meetup_id}/support-requests/{request_id}/comments/{comment_id}",
    tag = "Comments",
    operation_id = "editSupportRequestComment",
    summary = "Edit a comment",
    description = "Only the author may edit.",
    params(
        ("id" = i32, Path, description = "Meetup location ID"),
        ("meetup_id" = i32, Path, description = "Meetup ID"),
        ("request_id" = i32, Path, description = "Support request ID"),
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn edit_support_request_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, meetup_id, request_id, comment_id)): Path<(i32, i32, i32, i32)>,
    AppJson(payload): AppJson<CommentRequest>,
) -> Result<Json<CommentResponse>, AppError> {
    let on = CommentOn::SupportRequest {
        location_id: id,
        meetup_id,
        request_id,
    };
    edit(&state, auth_user, on, comment_id, payload).await
}

#[utoipa::path(
    delete,
    path = "/{id}/meetups/{meetup_id}/support-requests/{request_id}/comments/{comment_id}",
    tag = "Comments",
    operation_id = "deleteSupportRequestComment",
    summary = "Delete a comment",
    description = "The author or a site administrator.",
    params(
        ("id" = i32, Path, description = "Meetup location ID"),
        ("meetup_id" = i32, Path, description = "Meetup ID"),
        ("request_id" = i32, Path, description = "Support request ID"),
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_support_request_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, meetup_id, request_id, comment_id)): Path<(i32, i32, i32, i32)>,
) -> Result<StatusCode, AppError> {
    let on = CommentOn::SupportRequest {
        location_id: id,
        meetup_id,
        request_id,
    };
    Workflow::new(&state)
        .delete_comment(&auth_user, on, comment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
