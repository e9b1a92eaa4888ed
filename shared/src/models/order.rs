//! Order Model

use serde::{Deserialize, Serialize};

use crate::order::{OrderState, TaskType, TransitionError};

/// One unit of requested work
///
/// Existence of a row implies one quota unit of `task_type.quota_category()`
/// was debited when it was created (unless the owner was on the unmetered plan).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub client_id: i64,
    #[cfg_attr(feature = "db", sqlx(try_from = "String"))]
    pub task_type: TaskType,
    pub status: String,
    pub request_count: Option<i64>,
    pub caption: Option<String>,
    pub image_urls: Vec<String>,
    pub video_url: Option<String>,
    pub completed_link: Option<String>,
    pub completed_link2: Option<String>,
    pub guide_text: Option<String>,
    pub guide_file_url: Option<String>,
    pub draft_text: Option<String>,
    pub revision_text: Option<String>,
    pub revision_request: Option<String>,
    pub reviewer_name: Option<String>,
    #[serde(rename = "is_link_only")]
    pub is_link_only: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    /// Materialize a validated payload as a new row
    pub fn from_new(id: i64, client_id: i64, new: NewOrder, now: i64) -> Self {
        Self {
            id,
            client_id,
            task_type: new.task_type,
            status: new.status,
            request_count: new.request_count,
            caption: new.caption,
            image_urls: new.image_urls,
            video_url: new.video_url,
            completed_link: new.completed_link,
            completed_link2: new.completed_link2,
            guide_text: new.guide_text,
            guide_file_url: new.guide_file_url,
            draft_text: None,
            revision_text: None,
            revision_request: None,
            reviewer_name: new.reviewer_name,
            is_link_only: new.is_link_only,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn state(&self) -> Result<OrderState, TransitionError> {
        OrderState::parse(self.task_type, &self.status)
    }
}

/// Validated order payload, ready for quota reservation and insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub task_type: TaskType,
    pub status: String,
    pub request_count: Option<i64>,
    pub caption: Option<String>,
    pub image_urls: Vec<String>,
    pub video_url: Option<String>,
    pub completed_link: Option<String>,
    pub completed_link2: Option<String>,
    pub guide_text: Option<String>,
    pub guide_file_url: Option<String>,
    pub reviewer_name: Option<String>,
    pub is_link_only: bool,
}

impl NewOrder {
    /// Empty `pending` payload for a task type
    pub fn pending(task_type: TaskType) -> Self {
        Self {
            task_type,
            status: crate::order::STATUS_PENDING.to_string(),
            request_count: None,
            caption: None,
            image_urls: Vec::new(),
            video_url: None,
            completed_link: None,
            completed_link2: None,
            guide_text: None,
            guide_file_url: None,
            reviewer_name: None,
            is_link_only: false,
        }
    }
}

/// `GET /orders` query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    pub status: Option<String>,
    pub task_type: Option<String>,
    pub client_id: Option<i64>,
    /// Inclusive lower bound on `createdAt` (unix millis)
    pub from: Option<i64>,
    /// Inclusive upper bound on `createdAt` (unix millis)
    pub to: Option<i64>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}
