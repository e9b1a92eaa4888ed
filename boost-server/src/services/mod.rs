//! Business flows shared by the HTTP handlers
//!
//! Every function takes the application state and the authenticated caller,
//! enforces role rules itself, and records privileged actions through
//! [`AuditService`](crate::audit::AuditService).

pub mod audit_log;
pub mod orders;
pub mod points;
pub mod users;
