//! Admin user management endpoints

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use http::StatusCode;
use shared::error::AppError;
use shared::models::{
    CreateUserRequest, PlatformCredentials, SetQuotaRequest, UpdateUserRequest, User, UserQuery,
};
use shared::response::PaginatedResponse;

use crate::auth::CurrentUser;
use crate::services::users;
use crate::state::AppState;

use super::ApiResult;

/// GET /admin/users
pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
    Query(query): Query<UserQuery>,
) -> ApiResult<PaginatedResponse<User>> {
    Ok(Json(users::list_clients(&state, &actor, query).await?))
}

/// POST /admin/users
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = users::create_user(&state, &actor, req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /admin/users/{id}
pub async fn get(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<User> {
    Ok(Json(users::get_client(&state, &actor, id).await?))
}

/// PATCH /admin/users/{id}
pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<User> {
    Ok(Json(users::update_client(&state, &actor, id, req).await?))
}

/// DELETE /admin/users/{id}
pub async fn delete(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    users::delete_client(&state, &actor, id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// PUT /admin/users/{id}/quota
pub async fn set_quota(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<SetQuotaRequest>,
) -> ApiResult<User> {
    Ok(Json(users::set_quota(&state, &actor, id, req).await?))
}

/// POST /admin/users/{id}/block
pub async fn block(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<User> {
    Ok(Json(users::set_active(&state, &actor, id, false).await?))
}

/// POST /admin/users/{id}/unblock
pub async fn unblock(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<User> {
    Ok(Json(users::set_active(&state, &actor, id, true).await?))
}

/// GET /admin/users/{id}/credentials
pub async fn get_credentials(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<PlatformCredentials> {
    Ok(Json(users::get_credentials(&state, &actor, id).await?))
}

/// PUT /admin/users/{id}/credentials
pub async fn put_credentials(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(credentials): Json<PlatformCredentials>,
) -> ApiResult<serde_json::Value> {
    users::put_credentials(&state, &actor, id, credentials).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
