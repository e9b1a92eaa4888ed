//! Application state for boost-server

use std::sync::Arc;

use shared::models::{QuotaLedger, Role, User};
use sqlx::postgres::PgPoolOptions;

use crate::audit::{AuditService, AuditWorker};
use crate::auth::RateLimiter;
use crate::config::Config;
use crate::crypto::MasterKey;
use crate::db::{
    AuditRepository, OrderRepository, PgAuditRepository, PgOrderRepository,
    PgPointChargeRepository, PgUserRepository, PointChargeRepository, UserRepository,
};
use crate::error::BoxError;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub point_charges: Arc<dyn PointChargeRepository>,
    /// Read side of the audit log
    pub audit_logs: Arc<dyn AuditRepository>,
    /// Write side of the audit log
    pub audit: AuditService,
    /// HS256 secret for session tokens
    pub jwt_secret: String,
    /// Add `Secure` to session cookies
    pub secure_cookies: bool,
    /// Rate limiter for the login route
    pub rate_limiter: RateLimiter,
    /// Key for stored platform credentials
    pub master_key: Arc<MasterKey>,
}

/// Repository set handed to [`AppState::from_parts`]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub point_charges: Arc<dyn PointChargeRepository>,
    pub audit_logs: Arc<dyn AuditRepository>,
}

impl AppState {
    /// Connect to PostgreSQL, run migrations and start the audit worker
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        let master_key = MasterKey::from_config(&config.credential_key, config.is_development())?;

        let repos = Repositories {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            orders: Arc::new(PgOrderRepository::new(pool.clone())),
            point_charges: Arc::new(PgPointChargeRepository::new(pool.clone())),
            audit_logs: Arc::new(PgAuditRepository::new(pool)),
        };

        let state = Self::from_parts(
            repos,
            config.jwt_secret.clone(),
            master_key,
            config.secure_cookies(),
            config.audit_buffer_size,
        );

        if let Some((username, password)) = &config.bootstrap_superadmin {
            state.ensure_superadmin(username, password).await?;
        }

        Ok(state)
    }

    /// Assemble state from ready-made repositories. Spawns the audit worker,
    /// so this must run inside a tokio runtime.
    pub fn from_parts(
        repos: Repositories,
        jwt_secret: String,
        master_key: MasterKey,
        secure_cookies: bool,
        audit_buffer_size: usize,
    ) -> Self {
        let (audit, rx) = AuditService::new(audit_buffer_size);
        let worker = AuditWorker::new(repos.audit_logs.clone());
        tokio::spawn(worker.run(rx));

        Self {
            users: repos.users,
            orders: repos.orders,
            point_charges: repos.point_charges,
            audit_logs: repos.audit_logs,
            audit,
            jwt_secret,
            secure_cookies,
            rate_limiter: RateLimiter::new(),
            master_key: Arc::new(master_key),
        }
    }

    /// Create the configured superadmin if no account with that name exists
    async fn ensure_superadmin(&self, username: &str, password: &str) -> Result<(), BoxError> {
        if self
            .users
            .find_by_username(username)
            .await
            .map_err(|e| format!("bootstrap lookup failed: {e:?}"))?
            .is_some()
        {
            return Ok(());
        }

        let hashed_password = crate::util::hash_password(password)
            .map_err(|e| format!("bootstrap password hash failed: {e}"))?;
        let now = shared::util::now_millis();
        let user = User {
            id: shared::util::snowflake_id(),
            username: username.to_string(),
            hashed_password,
            role: Role::Superadmin,
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
        self.users
            .insert(&user)
            .await
            .map_err(|e| format!("bootstrap insert failed: {e:?}"))?;
        tracing::info!(username = %username, "Bootstrap superadmin created");
        Ok(())
    }
}
