//! Admin activity audit trail
//!
//! ```text
//! privileged handler
//!   └─ AuditService::log() ─try_send→ mpsc ─→ AuditWorker ─→ AuditRepository (admin_activity_logs)
//! ```
//!
//! Append-only: there is no update or delete path.

pub mod service;
pub mod worker;

pub use service::AuditService;
pub use worker::AuditWorker;
