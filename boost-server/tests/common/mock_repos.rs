//! In-memory repositories for testing
//!
//! Every repository shares the same tables so cross-table operations (quota
//! debit with order insert, charge approval with point credit) behave like
//! the PostgreSQL ones. Holding a `get_mut` guard on the client row stands in
//! for `SELECT ... FOR UPDATE`.

use async_trait::async_trait;
use boost_server::db::{
    AuditFilter, AuditRepository, ChargeFilter, OrderFilter, OrderRepository,
    PointChargeRepository, UserFilter, UserRepository,
};
use boost_server::error::ServiceResult;
use dashmap::DashMap;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    AdminActivityLog, ChargeDecision, Order, PointCharge, QuotaCategory, QuotaLedger,
    QuotaSnapshot, Reservation, Role, User,
};
use shared::response::Page;
use std::sync::Arc;

/// Shared in-memory tables
#[derive(Default, Clone)]
pub struct MemoryDb {
    pub users: Arc<DashMap<i64, User>>,
    pub orders: Arc<DashMap<i64, Order>>,
    pub charges: Arc<DashMap<i64, PointCharge>>,
    pub audit: Arc<DashMap<i64, AdminActivityLog>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row directly, bypassing validation
    pub fn insert_user(&self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn user(&self, id: i64) -> User {
        self.users.get(&id).map(|r| r.value().clone()).expect("user exists")
    }

    pub fn orders_of(&self, client_id: i64) -> Vec<Order> {
        self.orders
            .iter()
            .filter(|r| r.client_id == client_id)
            .map(|r| r.value().clone())
            .collect()
    }

    pub fn audit_entries(&self) -> Vec<AdminActivityLog> {
        let mut entries: Vec<_> = self.audit.iter().map(|r| r.value().clone()).collect();
        entries.sort_by_key(|e| (e.created_at, e.id));
        entries
    }
}

fn paginate<T>(mut items: Vec<T>, page: Page) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    let items = items
        .drain(..)
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();
    (items, total)
}

fn in_range(ts: i64, from: Option<i64>, to: Option<i64>) -> bool {
    from.is_none_or(|f| ts >= f) && to.is_none_or(|t| ts <= t)
}

#[async_trait]
impl UserRepository for MemoryDb {
    async fn find_by_id(&self, id: i64) -> ServiceResult<Option<User>> {
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_username(&self, username: &str) -> ServiceResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|r| r.username == username)
            .map(|r| r.value().clone()))
    }

    async fn list_clients(&self, filter: &UserFilter, page: Page) -> ServiceResult<(Vec<User>, u64)> {
        let needle = filter.search.as_ref().map(|s| s.to_lowercase());
        let mut items: Vec<User> = self
            .users
            .iter()
            .filter(|r| r.role == Role::Client)
            .filter(|r| filter.is_active.is_none_or(|a| r.is_active == a))
            .filter(|r| {
                needle.as_ref().is_none_or(|n| {
                    r.username.to_lowercase().contains(n)
                        || r
                            .company_name
                            .as_ref()
                            .is_some_and(|c| c.to_lowercase().contains(n))
                })
            })
            .map(|r| r.value().clone())
            .collect();
        items.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(paginate(items, page))
    }

    async fn insert(&self, user: &User) -> ServiceResult<()> {
        if self.users.iter().any(|r| r.username == user.username) {
            return Err(AppError::new(ErrorCode::UsernameExists).into());
        }
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_profile(&self, user: &User) -> ServiceResult<bool> {
        let Some(mut row) = self.users.get_mut(&user.id) else {
            return Ok(false);
        };
        row.company_name = user.company_name.clone();
        row.contract_start_date = user.contract_start_date;
        row.contract_end_date = user.contract_end_date;
        row.hashed_password = user.hashed_password.clone();
        row.updated_at = user.updated_at;
        Ok(true)
    }

    async fn set_quota(
        &self,
        id: i64,
        snapshot: &QuotaSnapshot,
        now: i64,
    ) -> ServiceResult<Option<(QuotaLedger, User)>> {
        let Some(mut row) = self.users.get_mut(&id) else {
            return Ok(None);
        };
        if row.role != Role::Client {
            return Ok(None);
        }
        let before = row.quota.clone();
        let mut quota = before.clone();
        quota.direct_set(snapshot)?;
        row.set_quota(quota);
        row.updated_at = now;
        Ok(Some((before, row.value().clone())))
    }

    async fn set_active(&self, id: i64, active: bool, now: i64) -> ServiceResult<bool> {
        let Some(mut row) = self.users.get_mut(&id) else {
            return Ok(false);
        };
        row.is_active = active;
        row.updated_at = now;
        Ok(true)
    }

    async fn set_credentials(&self, id: i64, encrypted: Option<&str>, now: i64) -> ServiceResult<bool> {
        let Some(mut row) = self.users.get_mut(&id) else {
            return Ok(false);
        };
        if row.role != Role::Client {
            return Ok(false);
        }
        row.encrypted_credentials = encrypted.map(str::to_string);
        row.updated_at = now;
        Ok(true)
    }

    async fn delete(&self, id: i64) -> ServiceResult<bool> {
        if self.users.remove(&id).is_none() {
            return Ok(false);
        }
        self.orders.retain(|_, o| o.client_id != id);
        self.charges.retain(|_, c| c.client_id != id);
        Ok(true)
    }
}

#[async_trait]
impl OrderRepository for MemoryDb {
    async fn reserve_and_insert(
        &self,
        client_id: i64,
        category: QuotaCategory,
        orders: &[Order],
    ) -> ServiceResult<Reservation> {
        let mut client = match self.users.get_mut(&client_id) {
            Some(row) if row.role == Role::Client => row,
            _ => return Err(AppError::new(ErrorCode::ClientNotFound).into()),
        };

        let mut quota = client.quota.clone();
        let reservation = quota.reserve(category, orders.len() as i64)?;
        if let Reservation::Debited { .. } = reservation {
            client.set_quota(quota);
        }
        for order in orders {
            self.orders.insert(order.id, order.clone());
        }
        Ok(reservation)
    }

    async fn find_by_id(&self, id: i64) -> ServiceResult<Option<Order>> {
        Ok(self.orders.get(&id).map(|r| r.value().clone()))
    }

    async fn list(&self, filter: &OrderFilter, page: Page) -> ServiceResult<(Vec<Order>, u64)> {
        let mut items: Vec<Order> = self
            .orders
            .iter()
            .filter(|r| filter.client_id.is_none_or(|c| r.client_id == c))
            .filter(|r| filter.status.as_ref().is_none_or(|s| &r.status == s))
            .filter(|r| filter.task_type.is_none_or(|t| r.task_type == t))
            .filter(|r| in_range(r.created_at, filter.from, filter.to))
            .map(|r| r.value().clone())
            .collect();
        items.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(paginate(items, page))
    }

    async fn update(&self, order: &Order, expected_status: &str) -> ServiceResult<bool> {
        let Some(mut row) = self.orders.get_mut(&order.id) else {
            return Ok(false);
        };
        if row.status != expected_status {
            return Ok(false);
        }
        *row = order.clone();
        Ok(true)
    }

    async fn delete(&self, id: i64) -> ServiceResult<bool> {
        Ok(self.orders.remove(&id).is_some())
    }
}

#[async_trait]
impl PointChargeRepository for MemoryDb {
    async fn insert(&self, charge: &PointCharge) -> ServiceResult<()> {
        self.charges.insert(charge.id, charge.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> ServiceResult<Option<PointCharge>> {
        Ok(self.charges.get(&id).map(|r| r.value().clone()))
    }

    async fn list(
        &self,
        filter: &ChargeFilter,
        page: Page,
    ) -> ServiceResult<(Vec<PointCharge>, u64)> {
        let mut items: Vec<PointCharge> = self
            .charges
            .iter()
            .filter(|r| filter.client_id.is_none_or(|c| r.client_id == c))
            .filter(|r| filter.status.is_none_or(|s| r.status == s))
            .map(|r| r.value().clone())
            .collect();
        items.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(paginate(items, page))
    }

    async fn resolve(
        &self,
        id: i64,
        decision: ChargeDecision,
        admin_id: i64,
        note: Option<String>,
        now: i64,
    ) -> ServiceResult<PointCharge> {
        let mut row = self
            .charges
            .get_mut(&id)
            .ok_or_else(|| AppError::new(ErrorCode::PointChargeNotFound))?;

        let mut charge = row.value().clone();
        let credit = charge.resolve(decision, admin_id, note, now)?;
        if credit > 0 {
            let mut client = self
                .users
                .get_mut(&charge.client_id)
                .ok_or_else(|| AppError::new(ErrorCode::ClientNotFound))?;
            // bigint overflow fails the transaction in Postgres
            client.points = client
                .points
                .checked_add(credit)
                .ok_or_else(|| AppError::internal("points balance overflow"))?;
            client.updated_at = now;
        }
        *row = charge.clone();
        Ok(charge)
    }
}

#[async_trait]
impl AuditRepository for MemoryDb {
    async fn insert(&self, entry: &AdminActivityLog) -> ServiceResult<()> {
        self.audit.insert(entry.id, entry.clone());
        Ok(())
    }

    async fn query(
        &self,
        filter: &AuditFilter,
        page: Page,
    ) -> ServiceResult<(Vec<AdminActivityLog>, u64)> {
        let mut items: Vec<AdminActivityLog> = self
            .audit
            .iter()
            .filter(|r| filter.admin_id.is_none_or(|a| r.admin_id == a))
            .filter(|r| filter.action.is_none_or(|a| r.action == a))
            .filter(|r| filter.target_type.is_none_or(|t| r.target_type == t))
            .filter(|r| in_range(r.created_at, filter.from, filter.to))
            .map(|r| r.value().clone())
            .collect();
        items.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(paginate(items, page))
    }
}
