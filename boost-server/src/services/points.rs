//! Point charge requests and their resolution

use serde_json::json;
use shared::models::{
    AdminAction, ChargeDecision, ChargeQuery, ChargeRequest, PointCharge, ResolveChargeRequest,
};
use shared::response::{Page, PaginatedResponse};
use shared::util::{now_millis, snowflake_id};

use crate::auth::CurrentUser;
use crate::db::ChargeFilter;
use crate::error::ServiceResult;
use crate::state::AppState;

/// `POST /points/charge`
pub async fn request(
    state: &AppState,
    actor: &CurrentUser,
    req: ChargeRequest,
) -> ServiceResult<PointCharge> {
    actor.require_client()?;
    let charge = PointCharge::new_request(snowflake_id(), actor.id, req.points, now_millis())?;
    state.point_charges.insert(&charge).await?;

    tracing::info!(
        charge_id = charge.id,
        client_id = actor.id,
        points = charge.points,
        amount = charge.amount,
        "Point charge requested"
    );
    Ok(charge)
}

/// `GET /points/charges` (staff)
pub async fn list(
    state: &AppState,
    actor: &CurrentUser,
    query: ChargeQuery,
) -> ServiceResult<PaginatedResponse<PointCharge>> {
    actor.require_staff()?;
    let filter = ChargeFilter {
        client_id: query.client_id,
        status: query.status,
    };
    let page = Page::new(query.page, query.per_page);
    let (items, total) = state.point_charges.list(&filter, page).await?;
    Ok(PaginatedResponse::new(items, page, total))
}

/// `GET /points/charges/my`
pub async fn list_mine(
    state: &AppState,
    actor: &CurrentUser,
    query: ChargeQuery,
) -> ServiceResult<PaginatedResponse<PointCharge>> {
    actor.require_client()?;
    let filter = ChargeFilter {
        client_id: Some(actor.id),
        status: query.status,
    };
    let page = Page::new(query.page, query.per_page);
    let (items, total) = state.point_charges.list(&filter, page).await?;
    Ok(PaginatedResponse::new(items, page, total))
}

/// `PATCH /points/charges/:id`
///
/// Approval credits exactly `points` to the client's balance; the quota
/// ledger is never touched.
pub async fn resolve(
    state: &AppState,
    actor: &CurrentUser,
    id: i64,
    req: ResolveChargeRequest,
) -> ServiceResult<PointCharge> {
    actor.require_staff()?;
    let charge = state
        .point_charges
        .resolve(id, req.status, actor.id, req.admin_note, now_millis())
        .await?;

    let action = match req.status {
        ChargeDecision::Approved => AdminAction::PointChargeApprove,
        ChargeDecision::Rejected => AdminAction::PointChargeReject,
    };
    state.audit.log(
        actor,
        action,
        Some(charge.id),
        json!({
            "clientId": charge.client_id,
            "points": charge.points,
            "amount": charge.amount,
            "adminNote": charge.admin_note,
        }),
    );

    tracing::info!(charge_id = charge.id, status = %charge.status, "Point charge resolved");
    Ok(charge)
}
