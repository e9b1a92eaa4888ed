//! User Model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::quota::{Plan, QuotaLedger, QuotaSnapshot};
use super::role::Role;

/// Account row (clients and staff share one table)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub hashed_password: String,
    #[cfg_attr(feature = "db", sqlx(try_from = "String"))]
    pub role: Role,
    pub company_name: Option<String>,
    pub plan: Option<String>,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub quota: QuotaLedger,
    /// Sum of `remaining` over the canonical categories
    pub remaining_quota: i64,
    pub points: i64,
    pub contract_start_date: Option<NaiveDate>,
    pub contract_end_date: Option<NaiveDate>,
    pub is_active: bool,
    /// base64(nonce || ciphertext || tag)
    #[serde(skip_serializing, default)]
    pub encrypted_credentials: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    /// Replace the ledger and refresh the materialized aggregate
    pub fn set_quota(&mut self, quota: QuotaLedger) {
        self.remaining_quota = quota.remaining_total();
        self.quota = quota;
    }

    /// Contract end date has passed
    pub fn contract_expired(&self, today: NaiveDate) -> bool {
        self.contract_end_date.is_some_and(|end| end < today)
    }
}

/// `POST /auth/login` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// `POST /auth/login` response (the token is also set as the session cookie)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// `POST /admin/users` body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub plan: Option<Plan>,
    /// Explicit snapshot overriding the plan preset
    #[serde(default)]
    pub quota: Option<QuotaSnapshot>,
    #[serde(default)]
    pub contract_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub contract_end_date: Option<NaiveDate>,
}

/// `PATCH /admin/users/:id` body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub company_name: Option<String>,
    pub contract_start_date: Option<NaiveDate>,
    pub contract_end_date: Option<NaiveDate>,
    pub password: Option<String>,
}

/// `PUT /admin/users/:id/quota` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetQuotaRequest {
    pub quota: QuotaSnapshot,
}

/// `GET /admin/users` query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub is_active: Option<bool>,
    /// Matches username or company name
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// External platform login kept for a client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlatformCredentials {
    pub platform_id: String,
    pub platform_password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}
