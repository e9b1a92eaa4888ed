//! Data models
//!
//! Shared between boost-server and its API consumers.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` snowflakes, all timestamps unix millis.

pub mod admin_log;
pub mod order;
pub mod point_charge;
pub mod quota;
pub mod role;
pub mod user;

// Re-exports
pub use admin_log::*;
pub use order::*;
pub use point_charge::*;
pub use quota::*;
pub use role::*;
pub use user::*;
