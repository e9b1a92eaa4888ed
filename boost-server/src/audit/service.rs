//! Audit log service
//!
//! Handlers hand entries to `AuditService::log`, which never blocks and never
//! fails the request: a full or closed channel drops the entry with an error
//! log. `AuditWorker` persists whatever arrives.

use serde_json::Value;
use shared::models::{AdminAction, AdminActivityLog};
use tokio::sync::mpsc;

use crate::auth::CurrentUser;

/// Fire-and-forget audit writer
#[derive(Clone, Debug)]
pub struct AuditService {
    tx: mpsc::Sender<AdminActivityLog>,
}

impl AuditService {
    pub fn new(buffer_size: usize) -> (Self, mpsc::Receiver<AdminActivityLog>) {
        let (tx, rx) = mpsc::channel(buffer_size.max(1));
        (Self { tx }, rx)
    }

    /// Record a privileged action taken by `actor`
    pub fn log(&self, actor: &CurrentUser, action: AdminAction, target_id: Option<i64>, details: Value) {
        let entry = AdminActivityLog {
            id: shared::util::snowflake_id(),
            admin_id: actor.id,
            admin_username: actor.username.clone(),
            action,
            target_type: action.target_type(),
            target_id,
            details,
            ip_address: actor.ip_address.clone(),
            user_agent: actor.user_agent.clone(),
            created_at: shared::util::now_millis(),
        };

        if let Err(e) = self.tx.try_send(entry) {
            let (reason, entry) = match e {
                mpsc::error::TrySendError::Full(entry) => ("channel full", entry),
                mpsc::error::TrySendError::Closed(entry) => ("channel closed", entry),
            };
            tracing::error!(
                action = %entry.action,
                admin_id = entry.admin_id,
                target_id = ?entry.target_id,
                "Audit entry dropped: {reason}"
            );
        }
    }
}
