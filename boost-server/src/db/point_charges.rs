//! Point charge queries

use async_trait::async_trait;
use shared::error::{AppError, ErrorCode};
use shared::models::{ChargeDecision, PointCharge};
use shared::response::Page;
use sqlx::PgPool;

use super::users::credit_points;
use super::{ChargeFilter, PointChargeRepository};
use crate::error::ServiceResult;

const CHARGE_COLUMNS: &str =
    "id, client_id, points, amount, status, admin_id, admin_note, approved_at, resolved_at, created_at";

const CHARGE_FILTER: &str =
    "WHERE ($1::bigint IS NULL OR client_id = $1) AND ($2::text IS NULL OR status = $2)";

#[derive(Clone)]
pub struct PgPointChargeRepository {
    pool: PgPool,
}

impl PgPointChargeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PointChargeRepository for PgPointChargeRepository {
    async fn insert(&self, charge: &PointCharge) -> ServiceResult<()> {
        sqlx::query(&format!(
            "INSERT INTO point_charges ({CHARGE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        ))
        .bind(charge.id)
        .bind(charge.client_id)
        .bind(charge.points)
        .bind(charge.amount)
        .bind(charge.status.as_str())
        .bind(charge.admin_id)
        .bind(&charge.admin_note)
        .bind(charge.approved_at)
        .bind(charge.resolved_at)
        .bind(charge.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> ServiceResult<Option<PointCharge>> {
        let row: Option<PointCharge> =
            sqlx::query_as(&format!("SELECT {CHARGE_COLUMNS} FROM point_charges WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row)
    }

    async fn list(
        &self,
        filter: &ChargeFilter,
        page: Page,
    ) -> ServiceResult<(Vec<PointCharge>, u64)> {
        let status = filter.status.map(|s| s.as_str());

        let rows: Vec<PointCharge> = sqlx::query_as(&format!(
            "SELECT {CHARGE_COLUMNS} FROM point_charges {CHARGE_FILTER} \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4"
        ))
        .bind(filter.client_id)
        .bind(status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM point_charges {CHARGE_FILTER}"))
                .bind(filter.client_id)
                .bind(status)
                .fetch_one(&self.pool)
                .await?;

        Ok((rows, total.max(0) as u64))
    }

    async fn resolve(
        &self,
        id: i64,
        decision: ChargeDecision,
        admin_id: i64,
        note: Option<String>,
        now: i64,
    ) -> ServiceResult<PointCharge> {
        let mut tx = self.pool.begin().await?;

        let mut charge: PointCharge = sqlx::query_as(&format!(
            "SELECT {CHARGE_COLUMNS} FROM point_charges WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::PointChargeNotFound))?;

        let credit = charge.resolve(decision, admin_id, note, now)?;

        sqlx::query(
            r#"
            UPDATE point_charges
            SET status = $2, admin_id = $3, admin_note = $4, approved_at = $5, resolved_at = $6
            WHERE id = $1
            "#,
        )
        .bind(charge.id)
        .bind(charge.status.as_str())
        .bind(charge.admin_id)
        .bind(&charge.admin_note)
        .bind(charge.approved_at)
        .bind(charge.resolved_at)
        .execute(&mut *tx)
        .await?;

        if credit > 0 && !credit_points(&mut tx, charge.client_id, credit, now).await? {
            return Err(AppError::new(ErrorCode::ClientNotFound).into());
        }

        tx.commit().await?;
        Ok(charge)
    }
}
