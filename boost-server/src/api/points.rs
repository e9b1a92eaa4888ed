//! Point charge endpoints

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use http::StatusCode;
use shared::error::AppError;
use shared::models::{ChargeQuery, ChargeRequest, PointCharge, ResolveChargeRequest};
use shared::response::PaginatedResponse;

use crate::auth::CurrentUser;
use crate::services::points;
use crate::state::AppState;

use super::ApiResult;

/// POST /points/charge
pub async fn request(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
    Json(req): Json<ChargeRequest>,
) -> Result<(StatusCode, Json<PointCharge>), AppError> {
    let charge = points::request(&state, &actor, req).await?;
    Ok((StatusCode::CREATED, Json(charge)))
}

/// GET /points/charges
pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
    Query(query): Query<ChargeQuery>,
) -> ApiResult<PaginatedResponse<PointCharge>> {
    Ok(Json(points::list(&state, &actor, query).await?))
}

/// GET /points/charges/my
pub async fn list_mine(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
    Query(query): Query<ChargeQuery>,
) -> ApiResult<PaginatedResponse<PointCharge>> {
    Ok(Json(points::list_mine(&state, &actor, query).await?))
}

/// PATCH /points/charges/{id}
pub async fn resolve(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<ResolveChargeRequest>,
) -> ApiResult<PointCharge> {
    Ok(Json(points::resolve(&state, &actor, id, req).await?))
}
