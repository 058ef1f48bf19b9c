use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::ObjectRef;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;

use super::created_or_ok;
use crate::entity::{location_member, meetup_location, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::location::*;
use crate::models::shared::{ListQuery, Pagination, escape_like};
use crate::state::AppState;
use crate::utils::access::find_location;
use crate::workflow::{Outcome, Workflow};

#[utoipa::path(
    post,
    path = "/",
    tag = "Meetup Locations",
    operation_id = "createLocation",
    summary = "Create a meetup location",
    description = "Site administrators only. The creator becomes the first member and organizer.",
    request_body = CreateLocationRequest,
    responses(
        (status = 201, description = "Location created", body = LocationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Slug taken (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(slug = %payload.slug))]
pub async fn create_location(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateLocationRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_location(&payload)?;
    let model = Workflow::new(&state)
        .create_location(&auth_user, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(LocationResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Meetup Locations",
    operation_id = "listLocations",
    summary = "List meetup locations",
    params(ListQuery),
    responses(
        (status = 200, description = "Meetup locations", body = LocationListResponse),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_locations(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<LocationListResponse>, AppError> {
    let (page, per_page) = query.window();
    let mut select = meetup_location::Entity::find();

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(meetup_location::Column::Name)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let data = select
        .order_by_asc(meetup_location::Column::Name)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(LocationResponse::from)
        .collect();

    Ok(Json(LocationListResponse {
        data,
        pagination: Pagination {
            page,
            per_page,
            total,
            total_pages: total.div_ceil(per_page),
        },
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Meetup Locations",
    operation_id = "getLocation",
    summary = "Get a meetup location by ID",
    params(("id" = i32, Path, description = "Meetup location ID")),
    responses(
        (status = 200, description = "Location details", body = LocationResponse),
        (status = 404, description = "Location not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<LocationResponse>, AppError> {
    Ok(Json(find_location(&state.db, id).await?.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Meetup Locations",
    operation_id = "updateLocation",
    summary = "Update a meetup location",
    description = "Site administrators only. Only provided fields change. An empty payload returns the location unchanged.",
    params(("id" = i32, Path, description = "Meetup location ID")),
    request_body = UpdateLocationRequest,
    responses(
        (status = 200, description = "Location updated", body = LocationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Location not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_location(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateLocationRequest>,
) -> Result<Json<LocationResponse>, AppError> {
    validate_update_location(&payload)?;
    let model = Workflow::new(&state)
        .update_location(&auth_user, id, payload)
        .await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Meetup Locations",
    operation_id = "deleteLocation",
    summary = "Delete a meetup location",
    description = "Site administrators only. Removes its meetups, members, pending requests and every role and capability scoped to it.",
    params(("id" = i32, Path, description = "Meetup location ID")),
    responses(
        (status = 204, description = "Location deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Location not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_location(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    Workflow::new(&state).delete_location(&auth_user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{id}/members",
    tag = "Meetup Locations",
    operation_id = "listLocationMembers",
    summary = "List members, organizers first",
    params(("id" = i32, Path, description = "Meetup location ID")),
    responses(
        (status = 200, description = "Members", body = Vec<LocationMemberResponse>),
        (status = 404, description = "Location not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_members(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<LocationMemberResponse>>, AppError> {
    find_location(&state.db, id).await?;

    let rows = location_member::Entity::find()
        .filter(location_member::Column::LocationId.eq(id))
        .find_also_related(user::Entity)
        .order_by_desc(location_member::Column::IsOrganizer)
        .order_by_asc(location_member::Column::JoinedAt)
        .all(&state.db)
        .await?;

    let items = rows
        .into_iter()
        .map(|(m, usr)| LocationMemberResponse {
            location_id: m.location_id,
            user_id: m.user_id,
            username: usr.map(|u| u.username).unwrap_or_default(),
            is_organizer: m.is_organizer,
            joined_at: m.joined_at,
        })
        .collect();

    Ok(Json(items))
}

#[utoipa::path(
    post,
    path = "/{id}/members",
    tag = "Meetup Location Members",
    operation_id = "addLocationMember",
    summary = "Add a member directly",
    description = "Requires `add_meetup_location_member`. Returns `already_member` when the user already belongs.",
    params(("id" = i32, Path, description = "Meetup location ID")),
    request_body = MemberRequest,
    responses(
        (status = 201, description = "Member added", body = Outcome<MembershipResponse>),
        (status = 200, description = "Already a member", body = Outcome<MembershipResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Location or user not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(member = payload.user_id))]
pub async fn add_member(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<MemberRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = Workflow::new(&state)
        .add_location_member(&auth_user, id, payload.user_id)
        .await?;
    Ok(created_or_ok(outcome.map(MembershipResponse::from)))
}

#[utoipa::path(
    delete,
    path = "/{id}/members/{user_id}",
    tag = "Meetup Location Members",
    operation_id = "removeLocationMember",
    summary = "Remove a member",
    description = "Requires `delete_meetup_location_member`. An organizer loses organizer status too. The last organizer cannot be removed (`sole_organizer`).",
    params(
        ("id" = i32, Path, description = "Meetup location ID"),
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "Removed, or `not_a_member` / `sole_organizer`", body = Outcome<MembershipResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Location or user not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(caller = auth_user.user_id))]
pub async fn remove_member(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(i32, i32)>,
) -> Result<Json<Outcome<MembershipResponse>>, AppError> {
    let outcome = Workflow::new(&state)
        .remove_location_member(&auth_user, id, user_id)
        .await?;
    Ok(Json(outcome.map(Into::into)))
}

#[utoipa::path(
    post,
    path = "/{id}/organizers",
    tag = "Meetup Location Members",
    operation_id = "promoteOrganizer",
    summary = "Make a member an organizer",
    description = "Requires `add_meetup_location_organizer`. Promoting an organizer again is a no-op.",
    params(("id" = i32, Path, description = "Meetup location ID")),
    request_body = MemberRequest,
    responses(
        (status = 200, description = "Promoted, or `not_a_member`", body = Outcome<MembershipResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Location or user not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(member = payload.user_id))]
pub async fn promote_organizer(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<MemberRequest>,
) -> Result<Json<Outcome<MembershipResponse>>, AppError> {
    let outcome = Workflow::new(&state)
        .promote_organizer(&auth_user, id, payload.user_id)
        .await?;
    Ok(Json(outcome.map(Into::into)))
}

#[utoipa::path(
    delete,
    path = "/{id}/organizers/{user_id}",
    tag = "Meetup Location Members",
    operation_id = "demoteOrganizer",
    summary = "Take organizer status away",
    description = "Requires `delete_meetup_location_organizer`. Membership is kept. The last organizer cannot be demoted (`sole_organizer`).",
    params(
        ("id" = i32, Path, description = "Meetup location ID"),
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "Demoted, or `sole_organizer` / `not_a_member`", body = Outcome<MembershipResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Location or user not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(caller = auth_user.user_id))]
pub async fn demote_organizer(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(i32, i32)>,
) -> Result<Json<Outcome<MembershipResponse>>, AppError> {
    let outcome = Workflow::new(&state)
        .demote_organizer(&auth_user, id, user_id)
        .await?;
    Ok(Json(outcome.map(Into::into)))
}

#[utoipa::path(
    post,
    path = "/{id}/join",
    tag = "Meetup Location Members",
    operation_id = "requestLocationJoin",
    summary = "Ask to join a meetup location",
    params(("id" = i32, Path, description = "Meetup location ID")),
    responses(
        (status = 201, description = "Request recorded", body = Outcome<MembershipRequestResponse>),
        (status = 200, description = "`already_member` or `already_requested`", body = Outcome<MembershipRequestResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Location not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn request_join(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = Workflow::new(&state)
        .request_join(&auth_user, ObjectRef::meetup_location(id))
        .await?;
    Ok(created_or_ok(outcome.map(MembershipRequestResponse::from)))
}

#[utoipa::path(
    post,
    path = "/{id}/organizer-requests",
    tag = "Meetup Location Members",
    operation_id = "requestOrganizerUpgrade",
    summary = "Ask to become an organizer",
    description = "Only members who are not yet organizers can ask.",
    params(("id" = i32, Path, description = "Meetup location ID")),
    responses(
        (status = 201, description = "Request recorded", body = Outcome<MembershipRequestResponse>),
        (status = 200, description = "`not_a_member`, `already_organizer` or `already_requested`", body = Outcome<MembershipRequestResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Location not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn request_organizer_upgrade(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = Workflow::new(&state)
        .request_organizer_upgrade(&auth_user, id)
        .await?;
    Ok(created_or_ok(outcome.map(MembershipRequestResponse::from)))
}

#[utoipa::path(
    get,
    path = "/{id}/requests",
    tag = "Meetup Location Members",
    operation_id = "listLocationRequests",
    summary = "List pending join and organizer requests",
    description = "Requires `approve_meetup_location_joinrequest`.",
    params(("id" = i32, Path, description = "Meetup location ID")),
    responses(
        (status = 200, description = "Pending requests", body = Vec<MembershipRequestResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Location not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_requests(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<MembershipRequestResponse>>, AppError> {
    let requests = Workflow::new(&state)
        .pending_membership_requests(&auth_user, ObjectRef::meetup_location(id))
        .await?;
    Ok(Json(requests.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/{id}/requests/{request_id}/approve",
    tag = "Meetup Location Members",
    operation_id = "approveLocationRequest",
    summary = "Approve a join or organizer request",
    description = "Join requests need `approve_meetup_location_joinrequest`; organizer requests need `add_meetup_location_organizer`.",
    params(
        ("id" = i32, Path, description = "Meetup location ID"),
        ("request_id" = i32, Path, description = "Request ID"),
    ),
    responses(
        (status = 200, description = "Approved, or `not_a_member`", body = Outcome<MembershipRequestResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Location or request not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Request already decided (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn approve_request(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, request_id)): Path<(i32, i32)>,
) -> Result<Json<Outcome<MembershipRequestResponse>>, AppError> {
    let outcome = Workflow::new(&state)
        .approve_membership_request(&auth_user, ObjectRef::meetup_location(id), request_id)
        .await?;
    Ok(Json(outcome.map(Into::into)))
}

#[utoipa::path(
    post,
    path = "/{id}/requests/{request_id}/reject",
    tag = "Meetup Location Members",
    operation_id = "rejectLocationRequest",
    summary = "Reject a join or organizer request",
    description = "Deletes the request. Requires `reject_meetup_location_joinrequest`.",
    params(
        ("id" = i32, Path, description = "Meetup location ID"),
        ("request_id" = i32, Path, description = "Request ID"),
    ),
    responses(
        (status = 200, description = "Rejected", body = Outcome<MembershipRequestResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Location or request not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn reject_request(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, request_id)): Path<(i32, i32)>,
) -> Result<Json<Outcome<MembershipRequestResponse>>, AppError> {
    let outcome = Workflow::new(&state)
        .reject_membership_request(&auth_user, ObjectRef::meetup_location(id), request_id)
        .await?;
    Ok(Json(outcome.map(Into::into)))
}
