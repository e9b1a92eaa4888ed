//! Database access layer
//!
//! Repository traits used by services and handlers, plus their PostgreSQL
//! implementations. Operations that must be atomic (quota reservation with
//! order insert, charge resolution with point credit) are single repository
//! calls so every implementation owns its own locking.

pub mod audit;
pub mod orders;
pub mod point_charges;
pub mod users;

use async_trait::async_trait;
use shared::models::{
    AdminAction, AdminActivityLog, ChargeDecision, ChargeStatus, Order, PointCharge,
    QuotaCategory, QuotaLedger, QuotaSnapshot, Reservation, TargetType, User,
};
use shared::order::TaskType;
use shared::response::Page;

use crate::error::ServiceResult;

pub use audit::PgAuditRepository;
pub use orders::PgOrderRepository;
pub use point_charges::PgPointChargeRepository;
pub use users::PgUserRepository;

/// Client list filter
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub is_active: Option<bool>,
    /// Case-insensitive substring of username or company name
    pub search: Option<String>,
}

/// Order list filter
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub client_id: Option<i64>,
    pub status: Option<String>,
    pub task_type: Option<TaskType>,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

/// Point charge list filter
#[derive(Debug, Clone, Default)]
pub struct ChargeFilter {
    pub client_id: Option<i64>,
    pub status: Option<ChargeStatus>,
}

/// Audit log filter
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub admin_id: Option<i64>,
    pub action: Option<AdminAction>,
    pub target_type: Option<TargetType>,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

/// Users (clients and staff)
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> ServiceResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> ServiceResult<Option<User>>;

    /// Clients only, newest first
    async fn list_clients(&self, filter: &UserFilter, page: Page) -> ServiceResult<(Vec<User>, u64)>;

    /// Fails with `UsernameExists` on a duplicate username
    async fn insert(&self, user: &User) -> ServiceResult<()>;

    /// Persist company name, contract window and password hash
    async fn update_profile(&self, user: &User) -> ServiceResult<bool>;

    /// Replace a client's whole ledger under the row lock.
    /// Returns the previous ledger and the updated user.
    async fn set_quota(
        &self,
        id: i64,
        snapshot: &QuotaSnapshot,
        now: i64,
    ) -> ServiceResult<Option<(QuotaLedger, User)>>;

    async fn set_active(&self, id: i64, active: bool, now: i64) -> ServiceResult<bool>;

    async fn set_credentials(&self, id: i64, encrypted: Option<&str>, now: i64) -> ServiceResult<bool>;

    async fn delete(&self, id: i64) -> ServiceResult<bool>;
}

/// Orders and the quota debit that pays for them
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Reserve one `category` unit per order from `client_id`'s ledger and
    /// insert every order, atomically and serialized per client.
    ///
    /// On `InsufficientQuota` (or any other error) nothing is written.
    async fn reserve_and_insert(
        &self,
        client_id: i64,
        category: QuotaCategory,
        orders: &[Order],
    ) -> ServiceResult<Reservation>;

    async fn find_by_id(&self, id: i64) -> ServiceResult<Option<Order>>;

    /// Newest first
    async fn list(&self, filter: &OrderFilter, page: Page) -> ServiceResult<(Vec<Order>, u64)>;

    /// Write back a patched order if its stored status is still `expected_status`
    async fn update(&self, order: &Order, expected_status: &str) -> ServiceResult<bool>;

    async fn delete(&self, id: i64) -> ServiceResult<bool>;
}

/// Point charge queue
#[async_trait]
pub trait PointChargeRepository: Send + Sync {
    async fn insert(&self, charge: &PointCharge) -> ServiceResult<()>;

    async fn find_by_id(&self, id: i64) -> ServiceResult<Option<PointCharge>>;

    /// Newest first
    async fn list(&self, filter: &ChargeFilter, page: Page)
    -> ServiceResult<(Vec<PointCharge>, u64)>;

    /// Resolve a pending charge under its row lock and, on approval, credit
    /// the client's `points` in the same transaction.
    ///
    /// Fails with `PointChargeNotFound` or `AlreadyResolved`.
    async fn resolve(
        &self,
        id: i64,
        decision: ChargeDecision,
        admin_id: i64,
        note: Option<String>,
        now: i64,
    ) -> ServiceResult<PointCharge>;
}

/// Admin activity log (append-only)
#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn insert(&self, entry: &AdminActivityLog) -> ServiceResult<()>;

    /// Newest first
    async fn query(
        &self,
        filter: &AuditFilter,
        page: Page,
    ) -> ServiceResult<(Vec<AdminActivityLog>, u64)>;
}
