//! Shared types for boost-desk
//!
//! Domain models, the quota ledger, the order workflow, error types and
//! response structures used by the server and its tests.

pub mod error;
pub mod models;
pub mod order;
pub mod response;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorCode};
pub use response::{Page, PaginatedResponse, Pagination};
