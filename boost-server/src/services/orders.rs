//! Order flows: creation with quota debit, review workflow, link-only import

use serde_json::json;
use shared::error::{AppError, ErrorCode};
use shared::models::{AdminAction, NewOrder, Order, OrderQuery, Reservation, Role};
use shared::order::{
    BulkImportResponse, CreateOrderRequest, ImportPlan, LinkImportResult, LinkImportRow,
    OrderPatch, ReviewOrderRequest, TaskType,
};
use shared::response::{Page, PaginatedResponse};
use shared::util::{non_blank, now_millis, snowflake_id, today};

use crate::auth::CurrentUser;
use crate::db::OrderFilter;
use crate::error::{ServiceError, ServiceResult};
use crate::state::AppState;

/// Upper bound on rows per bulk import
pub const MAX_IMPORT_ROWS: usize = 500;

/// `POST /orders`
pub async fn create(
    state: &AppState,
    actor: &CurrentUser,
    req: CreateOrderRequest,
) -> ServiceResult<Order> {
    actor.require_client()?;
    let new = req.validate()?;
    submit(state, actor.id, new).await
}

/// `POST /orders/review-request`
pub async fn create_review(
    state: &AppState,
    actor: &CurrentUser,
    req: ReviewOrderRequest,
) -> ServiceResult<Order> {
    actor.require_client()?;
    let new = req.validate()?;
    submit(state, actor.id, new).await
}

/// Check the client may order, then debit and insert in one repository call
async fn submit(state: &AppState, client_id: i64, new: NewOrder) -> ServiceResult<Order> {
    let client = state
        .users
        .find_by_id(client_id)
        .await?
        .filter(|u| u.role == Role::Client)
        .ok_or_else(|| AppError::new(ErrorCode::ClientNotFound))?;
    if !client.is_active {
        return Err(AppError::new(ErrorCode::AccountDisabled).into());
    }
    if client.contract_expired(today()) {
        return Err(AppError::new(ErrorCode::ContractExpired)
            .with_detail("contractEndDate", client.contract_end_date.map(|d| d.to_string()))
            .into());
    }

    let order = Order::from_new(snowflake_id(), client_id, new, now_millis());
    let category = order.task_type.quota_category();
    let reservation = state
        .orders
        .reserve_and_insert(client_id, category, std::slice::from_ref(&order))
        .await?;

    match reservation {
        Reservation::Debited { remaining, .. } => tracing::info!(
            order_id = order.id,
            client_id,
            category = %category,
            remaining,
            "Order created"
        ),
        Reservation::Unmetered => tracing::info!(
            order_id = order.id,
            client_id,
            category = %category,
            "Order created (unmetered plan)"
        ),
    }
    Ok(order)
}

/// `GET /orders/:id`: the owning client or any staff member
pub async fn get(state: &AppState, actor: &CurrentUser, id: i64) -> ServiceResult<Order> {
    let order = state
        .orders
        .find_by_id(id)
        .await?
        .filter(|o| actor.role.is_staff() || o.client_id == actor.id)
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    Ok(order)
}

/// `GET /orders`: clients only ever see their own orders
pub async fn list(
    state: &AppState,
    actor: &CurrentUser,
    query: OrderQuery,
) -> ServiceResult<PaginatedResponse<Order>> {
    let task_type = non_blank(query.task_type.as_deref())
        .map(str::parse::<TaskType>)
        .transpose()
        .map_err(AppError::from)?;
    let client_id = if actor.role.is_staff() {
        query.client_id
    } else {
        Some(actor.id)
    };

    let filter = OrderFilter {
        client_id,
        status: non_blank(query.status.as_deref()).map(str::to_string),
        task_type,
        from: query.from,
        to: query.to,
    };
    let page = Page::new(query.page, query.per_page);
    let (items, total) = state.orders.list(&filter, page).await?;
    Ok(PaginatedResponse::new(items, page, total))
}

/// `PATCH /orders/:id`
pub async fn patch(
    state: &AppState,
    actor: &CurrentUser,
    id: i64,
    patch: OrderPatch,
) -> ServiceResult<Order> {
    let mut order = state
        .orders
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    let expected_status = order.status.clone();

    let outcome = patch.apply(&mut order, actor.id, actor.role, now_millis())?;

    if !state.orders.update(&order, &expected_status).await? {
        return Err(AppError::with_message(
            ErrorCode::InvalidTransition,
            "주문 상태가 이미 변경되었습니다. 새로고침 후 다시 시도해주세요",
        )
        .with_detail("expected", expected_status)
        .into());
    }

    if let Some(action) = outcome.audit {
        state.audit.log(
            actor,
            action,
            Some(order.id),
            json!({
                "clientId": order.client_id,
                "taskType": order.task_type,
                "from": outcome.from,
                "to": outcome.to,
            }),
        );
    }
    tracing::info!(order_id = order.id, from = %outcome.from, to = %outcome.to, "Order updated");
    Ok(order)
}

/// `DELETE /orders/:id`: no quota refund
pub async fn delete(state: &AppState, actor: &CurrentUser, id: i64) -> ServiceResult<()> {
    actor.require_staff()?;
    let order = state
        .orders
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    if !state.orders.delete(id).await? {
        return Err(AppError::new(ErrorCode::OrderNotFound).into());
    }

    state.audit.log(
        actor,
        AdminAction::OrderDelete,
        Some(id),
        json!({
            "clientId": order.client_id,
            "taskType": order.task_type,
            "status": order.status,
        }),
    );
    Ok(())
}

/// `POST /orders/blog-receipt`
pub async fn import_link(
    state: &AppState,
    actor: &CurrentUser,
    row: LinkImportRow,
) -> ServiceResult<Order> {
    actor.require_staff()?;
    let (client_id, new) = row.validate()?;
    let order = Order::from_new(snowflake_id(), client_id, new, now_millis());
    let category = order.task_type.quota_category();

    state
        .orders
        .reserve_and_insert(client_id, category, std::slice::from_ref(&order))
        .await?;

    state.audit.log(
        actor,
        AdminAction::OrderImport,
        Some(order.id),
        json!({
            "clientId": client_id,
            "taskType": order.task_type,
            "count": 1,
        }),
    );
    Ok(order)
}

/// `POST /orders/blog-receipt/bulk`
///
/// Each `(client, category)` group is debited and inserted as a unit. A group
/// that cannot be paid for fails every one of its rows; other groups are
/// unaffected.
pub async fn import_bulk(
    state: &AppState,
    actor: &CurrentUser,
    rows: Vec<LinkImportRow>,
) -> ServiceResult<BulkImportResponse> {
    actor.require_staff()?;
    if rows.is_empty() {
        return Err(AppError::validation("등록할 행이 없습니다").into());
    }
    if rows.len() > MAX_IMPORT_ROWS {
        return Err(AppError::validation(format!(
            "한 번에 최대 {MAX_IMPORT_ROWS}건까지 등록할 수 있습니다"
        ))
        .with_detail("rows", rows.len())
        .into());
    }

    let plan = ImportPlan::build(rows);
    let mut results = plan.rejected;
    let now = now_millis();

    for group in plan.groups {
        let orders: Vec<Order> = group
            .rows
            .iter()
            .map(|(_, new)| Order::from_new(snowflake_id(), group.client_id, new.clone(), now))
            .collect();

        match state
            .orders
            .reserve_and_insert(group.client_id, group.category, &orders)
            .await
        {
            Ok(_) => {
                results.extend(
                    group
                        .rows
                        .iter()
                        .zip(&orders)
                        .map(|((row, _), order)| LinkImportResult::ok(*row, order.id)),
                );
                state.audit.log(
                    actor,
                    AdminAction::OrderImport,
                    None,
                    json!({
                        "clientId": group.client_id,
                        "category": group.category,
                        "count": group.count(),
                        "orderIds": orders.iter().map(|o| o.id).collect::<Vec<_>>(),
                    }),
                );
            }
            Err(ServiceError::App(err)) => {
                tracing::info!(
                    client_id = group.client_id,
                    category = %group.category,
                    rows = group.rows.len(),
                    "Import group rejected: {}",
                    err.message
                );
                results.extend(group.fail_all(&err.message));
            }
            Err(ServiceError::Db(err)) => {
                tracing::error!(
                    client_id = group.client_id,
                    category = %group.category,
                    "Import group failed: {err}"
                );
                results.extend(group.fail_all("처리 중 오류가 발생했습니다"));
            }
        }
    }

    Ok(BulkImportResponse::new(results))
}
