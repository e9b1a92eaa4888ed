//! Common test utilities for boost-server integration tests

pub mod mock_repos;

#[allow(unused_imports)]
pub use mock_repos::MemoryDb;

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use boost_server::auth::CurrentUser;
use boost_server::crypto::MasterKey;
use boost_server::state::{AppState, Repositories};
use shared::models::{AdminActivityLog, QuotaCategory, QuotaEntry, QuotaLedger, QuotaSnapshot, Role, User};

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const PASSWORD: &str = "correct-horse";

/// In-memory state plus a handle on its tables
pub struct TestApp {
    pub state: AppState,
    pub db: MemoryDb,
}

/// Must be called inside a tokio runtime (the audit worker is spawned)
pub fn test_app() -> TestApp {
    let db = MemoryDb::new();
    let repos = Repositories {
        users: Arc::new(db.clone()),
        orders: Arc::new(db.clone()),
        point_charges: Arc::new(db.clone()),
        audit_logs: Arc::new(db.clone()),
    };
    let state = AppState::from_parts(
        repos,
        JWT_SECRET.to_string(),
        MasterKey::from_bytes([7u8; 32]),
        false,
        64,
    );
    TestApp { state, db }
}

/// argon2 is slow in debug builds, so hash the shared test password once
fn password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| boost_server::util::hash_password(PASSWORD).unwrap())
        .clone()
}

/// Ledger with the given `(category, total, remaining)` entries
#[allow(dead_code)]
pub fn ledger(entries: &[(QuotaCategory, i64, i64)]) -> QuotaLedger {
    let snapshot: QuotaSnapshot = entries
        .iter()
        .map(|(c, total, remaining)| (*c, QuotaEntry::new(*total, *remaining)))
        .collect();
    QuotaLedger::from_snapshot(&snapshot).unwrap()
}

impl TestApp {
    /// Seed an active account; clients get `quota`, staff an empty ledger
    pub fn seed_user(&self, username: &str, role: Role, quota: QuotaLedger) -> User {
        let now = shared::util::now_millis();
        let mut user = User {
            id: shared::util::snowflake_id(),
            username: username.to_string(),
            hashed_password: password_hash(),
            role,
            company_name: None,
            plan: None,
            quota: QuotaLedger::new(),
            remaining_quota: 0,
            points: 0,
            contract_start_date: None,
            contract_end_date: None,
            is_active: true,
            encrypted_credentials: None,
            created_at: now,
            updated_at: now,
        };
        user.set_quota(quota);
        self.db.insert_user(user.clone());
        user
    }

    #[allow(dead_code)]
    pub fn seed_client(&self, username: &str, quota: QuotaLedger) -> User {
        self.seed_user(username, Role::Client, quota)
    }

    #[allow(dead_code)]
    pub fn seed_admin(&self, username: &str) -> User {
        self.seed_user(username, Role::Admin, QuotaLedger::new())
    }

    #[allow(dead_code)]
    pub fn seed_superadmin(&self, username: &str) -> User {
        self.seed_user(username, Role::Superadmin, QuotaLedger::new())
    }

    /// Session token for a seeded user
    #[allow(dead_code)]
    pub fn token(&self, user: &User) -> String {
        boost_server::auth::session::create_token(user.id, &user.username, user.role, JWT_SECRET)
            .unwrap()
    }

    /// Wait until the audit worker has persisted at least `count` entries
    #[allow(dead_code)]
    pub async fn wait_for_audit(&self, count: usize) -> Vec<AdminActivityLog> {
        for _ in 0..100 {
            let entries = self.db.audit_entries();
            if entries.len() >= count {
                return entries;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected {count} audit entries, found {}",
            self.db.audit_entries().len()
        );
    }
}

/// Authenticated caller for a seeded user
#[allow(dead_code)]
pub fn actor(user: &User) -> CurrentUser {
    CurrentUser {
        id: user.id,
        username: user.username.clone(),
        role: user.role,
        ip_address: Some("203.0.113.10".to_string()),
        user_agent: Some("integration-test".to_string()),
    }
}
