//! Admin activity log reads

use shared::models::{AdminActivityLog, AdminLogQuery};
use shared::response::{Page, PaginatedResponse};

use crate::auth::CurrentUser;
use crate::db::AuditFilter;
use crate::error::ServiceResult;
use crate::state::AppState;

/// `GET /admin/logs`: a plain admin only ever sees their own entries
pub async fn query(
    state: &AppState,
    actor: &CurrentUser,
    query: AdminLogQuery,
) -> ServiceResult<PaginatedResponse<AdminActivityLog>> {
    actor.require_staff()?;
    let admin_id = if actor.role.is_superadmin() {
        query.admin_id
    } else {
        Some(actor.id)
    };

    let filter = AuditFilter {
        admin_id,
        action: query.action,
        target_type: query.target_type,
        from: query.from,
        to: query.to,
    };
    let page = Page::new(query.page, query.per_page);
    let (items, total) = state.audit_logs.query(&filter, page).await?;
    Ok(PaginatedResponse::new(items, page, total))
}
