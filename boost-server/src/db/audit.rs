//! Admin activity log operations

use async_trait::async_trait;
use shared::models::AdminActivityLog;
use shared::response::Page;
use sqlx::PgPool;

use super::{AuditFilter, AuditRepository};
use crate::error::ServiceResult;

const LOG_COLUMNS: &str = "id, admin_id, admin_username, action, target_type, target_id, details, \
     ip_address, user_agent, created_at";

const LOG_FILTER: &str = "WHERE ($1::bigint IS NULL OR admin_id = $1) \
     AND ($2::text IS NULL OR action = $2) \
     AND ($3::text IS NULL OR target_type = $3) \
     AND ($4::bigint IS NULL OR created_at >= $4) \
     AND ($5::bigint IS NULL OR created_at <= $5)";

#[derive(Clone)]
pub struct PgAuditRepository {
    pool: PgPool,
}

impl PgAuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PgAuditRepository {
    async fn insert(&self, entry: &AdminActivityLog) -> ServiceResult<()> {
        sqlx::query(&format!(
            "INSERT INTO admin_activity_logs ({LOG_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        ))
        .bind(entry.id)
        .bind(entry.admin_id)
        .bind(&entry.admin_username)
        .bind(entry.action.as_str())
        .bind(entry.target_type.as_str())
        .bind(entry.target_id)
        .bind(&entry.details)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn query(
        &self,
        filter: &AuditFilter,
        page: Page,
    ) -> ServiceResult<(Vec<AdminActivityLog>, u64)> {
        let action = filter.action.map(|a| a.as_str());
        let target_type = filter.target_type.map(|t| t.as_str());

        let rows: Vec<AdminActivityLog> = sqlx::query_as(&format!(
            "SELECT {LOG_COLUMNS} FROM admin_activity_logs {LOG_FILTER} \
             ORDER BY created_at DESC, id DESC LIMIT $6 OFFSET $7"
        ))
        .bind(filter.admin_id)
        .bind(action)
        .bind(target_type)
        .bind(filter.from)
        .bind(filter.to)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM admin_activity_logs {LOG_FILTER}"))
                .bind(filter.admin_id)
                .bind(action)
                .bind(target_type)
                .bind(filter.from)
                .bind(filter.to)
                .fetch_one(&self.pool)
                .await?;

        Ok((rows, total.max(0) as u64))
    }
}
