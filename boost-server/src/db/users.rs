//! User queries

use async_trait::async_trait;
use shared::error::{AppError, ErrorCode};
use shared::models::{QuotaLedger, QuotaSnapshot, User};
use shared::response::Page;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use super::{UserFilter, UserRepository};
use crate::error::ServiceResult;

const USER_COLUMNS: &str = "id, username, hashed_password, role, company_name, plan, quota, \
     remaining_quota, points, contract_start_date, contract_end_date, is_active, \
     encrypted_credentials, created_at, updated_at";

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Lock a client row for the rest of the transaction and read its ledger
pub(crate) async fn lock_client_quota(
    conn: &mut PgConnection,
    client_id: i64,
) -> ServiceResult<Option<QuotaLedger>> {
    let row: Option<(Json<QuotaLedger>,)> =
        sqlx::query_as("SELECT quota FROM users WHERE id = $1 AND role = 'client' FOR UPDATE")
            .bind(client_id)
            .fetch_optional(conn)
            .await?;
    Ok(row.map(|(Json(quota),)| quota))
}

/// Write a ledger and its recomputed aggregate
pub(crate) async fn write_quota(
    conn: &mut PgConnection,
    client_id: i64,
    quota: &QuotaLedger,
    now: i64,
) -> ServiceResult<()> {
    sqlx::query("UPDATE users SET quota = $2, remaining_quota = $3, updated_at = $4 WHERE id = $1")
        .bind(client_id)
        .bind(Json(quota))
        .bind(quota.remaining_total())
        .bind(now)
        .execute(conn)
        .await?;
    Ok(())
}

/// Add to a client's point balance. Touches `points` only, never quota.
pub(crate) async fn credit_points(
    conn: &mut PgConnection,
    client_id: i64,
    points: i64,
    now: i64,
) -> ServiceResult<bool> {
    let rows = sqlx::query(
        "UPDATE users SET points = points + $2, updated_at = $3 WHERE id = $1 AND role = 'client'",
    )
    .bind(client_id)
    .bind(points)
    .bind(now)
    .execute(conn)
    .await?
    .rows_affected();
    Ok(rows > 0)
}

fn search_pattern(search: Option<&str>) -> Option<String> {
    shared::util::non_blank(search).map(|s| {
        let escaped = s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
        format!("%{escaped}%")
    })
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: i64) -> ServiceResult<Option<User>> {
        let row: Option<User> = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_by_username(&self, username: &str) -> ServiceResult<Option<User>> {
        let row: Option<User> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row)
    }

    async fn list_clients(&self, filter: &UserFilter, page: Page) -> ServiceResult<(Vec<User>, u64)> {
        const WHERE: &str = "WHERE role = 'client' \
             AND ($1::boolean IS NULL OR is_active = $1) \
             AND ($2::text IS NULL OR username ILIKE $2 OR company_name ILIKE $2)";
        let pattern = search_pattern(filter.search.as_deref());

        let rows: Vec<User> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users {WHERE} ORDER BY created_at DESC LIMIT $3 OFFSET $4"
        ))
        .bind(filter.is_active)
        .bind(&pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users {WHERE}"))
            .bind(filter.is_active)
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        Ok((rows, total.max(0) as u64))
    }

    async fn insert(&self, user: &User) -> ServiceResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, username, hashed_password, role, company_name, plan, quota,
                remaining_quota, points, contract_start_date, contract_end_date, is_active,
                encrypted_credentials, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.hashed_password)
        .bind(user.role.as_str())
        .bind(&user.company_name)
        .bind(&user.plan)
        .bind(Json(&user.quota))
        .bind(user.remaining_quota)
        .bind(user.points)
        .bind(user.contract_start_date)
        .bind(user.contract_end_date)
        .bind(user.is_active)
        .bind(&user.encrypted_credentials)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(AppError::new(ErrorCode::UsernameExists)
                    .with_detail("username", user.username.clone())
                    .into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_profile(&self, user: &User) -> ServiceResult<bool> {
        let rows = sqlx::query(
            r#"
            UPDATE users
            SET company_name = $2, contract_start_date = $3, contract_end_date = $4,
                hashed_password = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.company_name)
        .bind(user.contract_start_date)
        .bind(user.contract_end_date)
        .bind(&user.hashed_password)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(rows > 0)
    }

    async fn set_quota(
        &self,
        id: i64,
        snapshot: &QuotaSnapshot,
        now: i64,
    ) -> ServiceResult<Option<(QuotaLedger, User)>> {
        let mut tx = self.pool.begin().await?;

        let Some(before) = lock_client_quota(&mut tx, id).await? else {
            return Ok(None);
        };
        let mut quota = before.clone();
        quota.direct_set(snapshot)?;
        write_quota(&mut tx, id, &quota, now).await?;

        let user: User = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(Some((before, user)))
    }

    async fn set_active(&self, id: i64, active: bool, now: i64) -> ServiceResult<bool> {
        let rows = sqlx::query("UPDATE users SET is_active = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(active)
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows > 0)
    }

    async fn set_credentials(&self, id: i64, encrypted: Option<&str>, now: i64) -> ServiceResult<bool> {
        let rows = sqlx::query(
            "UPDATE users SET encrypted_credentials = $2, updated_at = $3 WHERE id = $1 AND role = 'client'",
        )
        .bind(id)
        .bind(encrypted)
        .bind(now)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(rows > 0)
    }

    async fn delete(&self, id: i64) -> ServiceResult<bool> {
        let rows = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_pattern_escapes_wildcards() {
        assert_eq!(search_pattern(Some(" cafe ")).as_deref(), Some("%cafe%"));
        assert_eq!(search_pattern(Some("50%_off")).as_deref(), Some("%50\\%\\_off%"));
        assert_eq!(search_pattern(Some("  ")), None);
    }
}
