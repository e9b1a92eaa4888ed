//! Order queries

use async_trait::async_trait;
use shared::error::{AppError, ErrorCode};
use shared::models::{Order, QuotaCategory, Reservation};
use shared::response::Page;
use sqlx::{PgConnection, PgPool};

use super::users::{lock_client_quota, write_quota};
use super::{OrderFilter, OrderRepository};
use crate::error::ServiceResult;

const ORDER_COLUMNS: &str = "id, client_id, task_type, status, request_count, caption, image_urls, \
     video_url, completed_link, completed_link2, guide_text, guide_file_url, draft_text, \
     revision_text, revision_request, reviewer_name, is_link_only, created_at, updated_at";

const ORDER_FILTER: &str = "WHERE ($1::bigint IS NULL OR client_id = $1) \
     AND ($2::text IS NULL OR status = $2) \
     AND ($3::text IS NULL OR task_type = $3) \
     AND ($4::bigint IS NULL OR created_at >= $4) \
     AND ($5::bigint IS NULL OR created_at <= $5)";

#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn insert_order(conn: &mut PgConnection, order: &Order) -> ServiceResult<()> {
    sqlx::query(&format!(
        "INSERT INTO orders ({ORDER_COLUMNS}) VALUES \
         ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)"
    ))
    .bind(order.id)
    .bind(order.client_id)
    .bind(order.task_type.as_str())
    .bind(&order.status)
    .bind(order.request_count)
    .bind(&order.caption)
    .bind(&order.image_urls)
    .bind(&order.video_url)
    .bind(&order.completed_link)
    .bind(&order.completed_link2)
    .bind(&order.guide_text)
    .bind(&order.guide_file_url)
    .bind(&order.draft_text)
    .bind(&order.revision_text)
    .bind(&order.revision_request)
    .bind(&order.reviewer_name)
    .bind(order.is_link_only)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn reserve_and_insert(
        &self,
        client_id: i64,
        category: QuotaCategory,
        orders: &[Order],
    ) -> ServiceResult<Reservation> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes every quota mutation for this client
        let mut quota = lock_client_quota(&mut tx, client_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::ClientNotFound))?;

        let reservation = quota.reserve(category, orders.len() as i64)?;
        if let Reservation::Debited { .. } = reservation {
            let now = orders.first().map(|o| o.created_at).unwrap_or_else(shared::util::now_millis);
            write_quota(&mut tx, client_id, &quota, now).await?;
        }

        for order in orders {
            insert_order(&mut tx, order).await?;
        }

        tx.commit().await?;
        Ok(reservation)
    }

    async fn find_by_id(&self, id: i64) -> ServiceResult<Option<Order>> {
        let row: Option<Order> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row)
    }

    async fn list(&self, filter: &OrderFilter, page: Page) -> ServiceResult<(Vec<Order>, u64)> {
        let task_type = filter.task_type.map(|t| t.as_str());

        let rows: Vec<Order> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders {ORDER_FILTER} \
             ORDER BY created_at DESC LIMIT $6 OFFSET $7"
        ))
        .bind(filter.client_id)
        .bind(&filter.status)
        .bind(task_type)
        .bind(filter.from)
        .bind(filter.to)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM orders {ORDER_FILTER}"))
            .bind(filter.client_id)
            .bind(&filter.status)
            .bind(task_type)
            .bind(filter.from)
            .bind(filter.to)
            .fetch_one(&self.pool)
            .await?;

        Ok((rows, total.max(0) as u64))
    }

    async fn update(&self, order: &Order, expected_status: &str) -> ServiceResult<bool> {
        let rows = sqlx::query(
            r#"
            UPDATE orders
            SET status = $3, completed_link = $4, completed_link2 = $5, draft_text = $6,
                revision_text = $7, revision_request = $8, reviewer_name = $9, updated_at = $10
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(order.id)
        .bind(expected_status)
        .bind(&order.status)
        .bind(&order.completed_link)
        .bind(&order.completed_link2)
        .bind(&order.draft_text)
        .bind(&order.revision_text)
        .bind(&order.revision_request)
        .bind(&order.reviewer_name)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(rows > 0)
    }

    async fn delete(&self, id: i64) -> ServiceResult<bool> {
        let rows = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows > 0)
    }
}
