//! Order domain
//!
//! - Task types and their quota category
//! - Generic statuses and the closed review draft workflow
//! - Creation payloads, link-only import and `PATCH` actions

pub mod create;
pub mod import;
pub mod patch;
pub mod status;
pub mod task;

// Re-exports
pub use create::{CreateOrderRequest, MAX_IMAGES, ReviewOrderRequest};
pub use import::{
    BulkImportRequest, BulkImportResponse, ImportGroup, ImportPlan, LinkImportResult,
    LinkImportRow,
};
pub use patch::{OrderPatch, PatchOutcome};
pub use status::{
    OrderState, ReviewAction, ReviewStatus, STATUS_DONE, STATUS_PENDING, STATUS_WORKING,
    TransitionError,
};
pub use task::{TaskType, UnsupportedTaskType};
