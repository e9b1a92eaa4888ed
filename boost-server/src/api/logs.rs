//! Audit log endpoint

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use shared::models::{AdminActivityLog, AdminLogQuery};
use shared::response::PaginatedResponse;

use crate::auth::CurrentUser;
use crate::services::audit_log;
use crate::state::AppState;

use super::ApiResult;

/// GET /admin/logs
pub async fn query(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
    Query(query): Query<AdminLogQuery>,
) -> ApiResult<PaginatedResponse<AdminActivityLog>> {
    Ok(Json(audit_log::query(&state, &actor, query).await?))
}
