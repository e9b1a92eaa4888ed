//! Order endpoints

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use http::StatusCode;
use serde::Serialize;
use shared::error::AppError;
use shared::models::{Order, OrderQuery};
use shared::order::{
    BulkImportRequest, BulkImportResponse, CreateOrderRequest, LinkImportRow, OrderPatch,
    ReviewOrderRequest,
};
use shared::response::PaginatedResponse;

use crate::auth::CurrentUser;
use crate::services::orders;
use crate::state::AppState;

use super::ApiResult;

/// `{ "order": ... }`
#[derive(Debug, Serialize)]
pub struct OrderBody {
    pub order: Order,
}

type Created = Result<(StatusCode, Json<OrderBody>), AppError>;

/// POST /orders
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
    Json(req): Json<CreateOrderRequest>,
) -> Created {
    let order = orders::create(&state, &actor, req).await?;
    Ok((StatusCode::CREATED, Json(OrderBody { order })))
}

/// POST /orders/review-request
pub async fn create_review(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
    Json(req): Json<ReviewOrderRequest>,
) -> Created {
    let order = orders::create_review(&state, &actor, req).await?;
    Ok((StatusCode::CREATED, Json(OrderBody { order })))
}

/// GET /orders
pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
    Query(query): Query<OrderQuery>,
) -> ApiResult<PaginatedResponse<Order>> {
    Ok(Json(orders::list(&state, &actor, query).await?))
}

/// GET /orders/{id}
pub async fn get(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<OrderBody> {
    let order = orders::get(&state, &actor, id).await?;
    Ok(Json(OrderBody { order }))
}

/// PATCH /orders/{id}
pub async fn patch(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(patch): Json<OrderPatch>,
) -> ApiResult<OrderBody> {
    let order = orders::patch(&state, &actor, id, patch).await?;
    Ok(Json(OrderBody { order }))
}

/// DELETE /orders/{id}
pub async fn delete(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    orders::delete(&state, &actor, id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// POST /orders/blog-receipt
pub async fn import_link(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
    Json(row): Json<LinkImportRow>,
) -> Created {
    let order = orders::import_link(&state, &actor, row).await?;
    Ok((StatusCode::CREATED, Json(OrderBody { order })))
}

/// POST /orders/blog-receipt/bulk
pub async fn import_bulk(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
    Json(req): Json<BulkImportRequest>,
) -> ApiResult<BulkImportResponse> {
    Ok(Json(orders::import_bulk(&state, &actor, req.rows).await?))
}
