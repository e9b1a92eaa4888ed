//! Audit log background worker
//!
//! Consumes entries from the mpsc channel and appends them to the
//! repository. Exits when every sender is dropped.

use std::sync::Arc;

use shared::models::AdminActivityLog;
use tokio::sync::mpsc;

use crate::db::AuditRepository;

pub struct AuditWorker {
    repo: Arc<dyn AuditRepository>,
}

impl AuditWorker {
    pub fn new(repo: Arc<dyn AuditRepository>) -> Self {
        Self { repo }
    }

    /// Run until the channel closes. Insert failures are logged and skipped.
    pub async fn run(self, mut rx: mpsc::Receiver<AdminActivityLog>) {
        tracing::info!("Audit log worker started");

        while let Some(entry) = rx.recv().await {
            match self.repo.insert(&entry).await {
                Ok(()) => {
                    tracing::debug!(
                        audit_id = entry.id,
                        action = %entry.action,
                        target_type = %entry.target_type,
                        "Audit entry recorded"
                    );
                }
                Err(e) => {
                    tracing::error!(action = %entry.action, "Failed to write audit entry: {e:?}");
                }
            }
        }

        tracing::info!("Audit log channel closed, worker stopping");
    }
}
