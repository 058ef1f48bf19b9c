use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{ObjectKind, ObjectRef};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;

use super::created_or_ok;
use crate::entity::{community, community_member, role_assignment, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::community::*;
use crate::models::location::MembershipRequestResponse;
use crate::models::shared::{ListQuery, Pagination, escape_like};
use crate::state::AppState;
use crate::utils::access::find_community;
use crate::workflow::{Outcome, Workflow};

#[utoipa::path(
    post,
    path = "/",
    tag = "Communities",
    operation_id = "createCommunity",
    summary = "Create a community",
    description = "Creates a community. Site administrators only. The creator becomes its first member and `community_leader`.",
    request_body = CreateCommunityRequest,
    responses(
        (status = 201, description = "Community created", body = CommunityResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Slug taken (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(slug = %payload.slug))]
pub async fn create_community(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCommunityRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_community(&payload)?;
    let model = Workflow::new(&state)
        .create_community(&auth_user, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(CommunityResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Communities",
    operation_id = "listCommunities",
    summary = "List communities",
    params(ListQuery),
    responses(
        (status = 200, description = "Communities", body = CommunityListResponse),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_communities(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<CommunityListResponse>, AppError> {
    let (page, per_page) = query.window();
    let mut select = community::Entity::find();

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(community::Column::Name)))
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
        .order_by_asc(community::Column::Name)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(CommunityResponse::from)
        .collect();

    Ok(Json(CommunityListResponse {
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
    tag = "Communities",
    operation_id = "getCommunity",
    summary = "Get a community by ID",
    params(("id" = i32, Path, description = "Community ID")),
    responses(
        (status = 200, description = "Community details", body = CommunityResponse),
        (status = 404, description = "Community not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_community(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CommunityResponse>, AppError> {
    Ok(Json(find_community(&state.db, id).await?.into()))
}

#[utoipa::path(
    get,
    path = "/{id}/members",
    tag = "Communities",
    operation_id = "listCommunityMembers",
    summary = "List community members and their roles",
    params(("id" = i32, Path, description = "Community ID")),
    responses(
        (status = 200, description = "Members", body = Vec<CommunityMemberResponse>),
        (status = 404, description = "Community not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_community_members(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<CommunityMemberResponse>>, AppError> {
    find_community(&state.db, id).await?;

    let rows = community_member::Entity::find()
        .filter(community_member::Column::CommunityId.eq(id))
        .find_also_related(user::Entity)
        .order_by_asc(community_member::Column::JoinedAt)
        .all(&state.db)
        .await?;

    let mut roles: BTreeMap<i32, Vec<String>> = BTreeMap::new();
    for a in role_assignment::Entity::find()
        .filter(role_assignment::Column::TargetKind.eq(ObjectKind::Community.as_str()))
        .filter(role_assignment::Column::TargetId.eq(id))
        .all(&state.db)
        .await?
    {
        roles.entry(a.user_id).or_default().push(a.role_id);
    }

    let items = rows
        .into_iter()
        .map(|(m, usr)| CommunityMemberResponse {
            user_id: m.user_id,
            username: usr.map(|u| u.username).unwrap_or_default(),
            roles: roles.remove(&m.user_id).unwrap_or_default(),
            joined_at: m.joined_at,
        })
        .collect();

    Ok(Json(items))
}

#[utoipa::path(
    post,
    path = "/{id}/join",
    tag = "Community Membership",
    operation_id = "requestCommunityJoin",
    summary = "Ask to join a community",
    description = "Records a join request. Returns `already_member` or `already_requested` without changes when applicable.",
    params(("id" = i32, Path, description = "Community ID")),
    responses(
        (status = 201, description = "Request recorded", body = Outcome<MembershipRequestResponse>),
        (status = 200, description = "Already a member or already requested", body = Outcome<MembershipRequestResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Community not found (NOT_FOUND)", body = ErrorBody),
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
        .request_join(&auth_user, ObjectRef::community(id))
        .await?;
    Ok(created_or_ok(outcome.map(MembershipRequestResponse::from)))
}

#[utoipa::path(
    get,
    path = "/{id}/requests",
    tag = "Community Membership",
    operation_id = "listCommunityJoinRequests",
    summary = "List pending join requests",
    description = "Requires `approve_community_joinrequest` on the community.",
    params(("id" = i32, Path, description = "Community ID")),
    responses(
        (status = 200, description = "Pending requests", body = Vec<MembershipRequestResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Community not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_join_requests(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<MembershipRequestResponse>>, AppError> {
    let requests = Workflow::new(&state)
        .pending_membership_requests(&auth_user, ObjectRef::community(id))
        .await?;
    Ok(Json(requests.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/{id}/requests/{request_id}/approve",
    tag = "Community Membership",
    operation_id = "approveCommunityJoinRequest",
    summary = "Approve a join request",
    description = "Adds the requester as a member. Requires `approve_community_joinrequest`.",
    params(
        ("id" = i32, Path, description = "Community ID"),
        ("request_id" = i32, Path, description = "Request ID"),
    ),
    responses(
        (status = 200, description = "Request approved", body = Outcome<MembershipRequestResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Community or request not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Request already decided (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn approve_join_request(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, request_id)): Path<(i32, i32)>,
) -> Result<Json<Outcome<MembershipRequestResponse>>, AppError> {
    let outcome = Workflow::new(&state)
        .approve_membership_request(&auth_user, ObjectRef::community(id), request_id)
        .await?;
    Ok(Json(outcome.map(Into::into)))
}

#[utoipa::path(
    post,
    path = "/{id}/requests/{request_id}/reject",
    tag = "Community Membership",
    operation_id = "rejectCommunityJoinRequest",
    summary = "Reject a join request",
    description = "Deletes the request. Requires `approve_community_joinrequest`.",
    params(
        ("id" = i32, Path, description = "Community ID"),
        ("request_id" = i32, Path, description = "Request ID"),
    ),
    responses(
        (status = 200, description = "Request rejected", body = Outcome<MembershipRequestResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Community or request not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn reject_join_request(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, request_id)): Path<(i32, i32)>,
) -> Result<Json<Outcome<MembershipRequestResponse>>, AppError> {
    let outcome = Workflow::new(&state)
        .reject_membership_request(&auth_user, ObjectRef::community(id), request_id)
        .await?;
    Ok(Json(outcome.map(Into::into)))
}

#[utoipa::path(
    post,
    path = "/{id}/roles",
    tag = "Community Roles",
    operation_id = "grantCommunityRole",
    summary = "Grant a community role to a member",
    description = "Requires `change_community`, which only community leaders hold.",
    params(("id" = i32, Path, description = "Community ID")),
    request_body = CommunityRoleRequest,
    responses(
        (status = 200, description = "Role granted, or `not_a_member`", body = Outcome<RoleAssignmentResponse>),
        (status = 400, description = "Unknown role (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Community or user not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(role = %payload.role, grantee = payload.user_id))]
pub async fn grant_role(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<CommunityRoleRequest>,
) -> Result<Json<Outcome<RoleAssignmentResponse>>, AppError> {
    validate_role_request(&payload)?;
    let outcome = Workflow::new(&state)
        .grant_community_role(&auth_user, id, payload.user_id, payload.role.trim())
        .await?;
    Ok(Json(outcome.map(Into::into)))
}

#[utoipa::path(
    delete,
    path = "/{id}/roles/{user_id}/{role}",
    tag = "Community Roles",
    operation_id = "revokeCommunityRole",
    summary = "Revoke a community role",
    description = "Capabilities still owed to another role the user holds are kept. Requires `change_community`.",
    params(
        ("id" = i32, Path, description = "Community ID"),
        ("user_id" = i32, Path, description = "User ID"),
        ("role" = String, Path, description = "Role ID"),
    ),
    responses(
        (status = 200, description = "Role revoked (or was not held)", body = Outcome<RoleAssignmentResponse>),
        (status = 400, description = "Unknown role (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Community or user not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn revoke_role(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, user_id, role)): Path<(i32, i32, String)>,
) -> Result<Json<Outcome<RoleAssignmentResponse>>, AppError> {
    let outcome = Workflow::new(&state)
        .revoke_community_role(&auth_user, id, user_id, &role)
        .await?;
    Ok(Json(outcome.map(Into::into)))
}
