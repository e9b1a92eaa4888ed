//! Order status and the review draft workflow
//!
//! Generic task types carry an open status string that staff may set freely
//! (`pending`, `working`, `done` are the usual values). Review task types run
//! a closed workflow:
//!
//! ```text
//! pending -> draft_uploaded <-> revision_requested -> draft_revised -> client_approved -> published
//! ```
//!
//! `client_approved` is entered either by an explicit approval or by the
//! client editing the draft directly, and `published` is only reachable from
//! `client_approved`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::task::TaskType;
use crate::error::{AppError, ErrorCode};

/// Well-known generic status values
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_WORKING: &str = "working";
pub const STATUS_DONE: &str = "done";

/// Closed status set for review orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    DraftUploaded,
    RevisionRequested,
    DraftRevised,
    ClientApproved,
    Published,
}

impl ReviewStatus {
    pub const ALL: [ReviewStatus; 6] = [
        ReviewStatus::Pending,
        ReviewStatus::DraftUploaded,
        ReviewStatus::RevisionRequested,
        ReviewStatus::DraftRevised,
        ReviewStatus::ClientApproved,
        ReviewStatus::Published,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::DraftUploaded => "draft_uploaded",
            ReviewStatus::RevisionRequested => "revision_requested",
            ReviewStatus::DraftRevised => "draft_revised",
            ReviewStatus::ClientApproved => "client_approved",
            ReviewStatus::Published => "published",
        }
    }

    /// Guarded transition function
    pub fn apply(self, action: ReviewAction) -> Result<ReviewStatus, TransitionError> {
        use ReviewAction as A;
        use ReviewStatus as S;

        let next = match (self, action) {
            (S::Pending | S::DraftUploaded, A::UploadDraft) => S::DraftUploaded,
            (S::RevisionRequested, A::ReviseDraft) => S::DraftRevised,
            (S::DraftUploaded | S::DraftRevised, A::RequestRevision) => S::RevisionRequested,
            (S::DraftUploaded | S::DraftRevised, A::Approve | A::EditDraft) => S::ClientApproved,
            (S::ClientApproved, A::Publish) => S::Published,
            (from, action) => return Err(TransitionError::Illegal { from, action }),
        };
        Ok(next)
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = TransitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReviewStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| TransitionError::UnknownStatus(s.to_string()))
    }
}

/// Step in the review workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    /// Staff attaches the first draft (or replaces it before the client reacts)
    UploadDraft,
    /// Staff answers a revision request with a new draft
    ReviseDraft,
    /// Client asks for changes
    RequestRevision,
    /// Client accepts the draft as-is
    Approve,
    /// Client rewrites the draft text; accepted without another staff pass
    EditDraft,
    /// Staff attaches the published link
    Publish,
}

impl ReviewAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ReviewAction::UploadDraft => "upload_draft",
            ReviewAction::ReviseDraft => "revise_draft",
            ReviewAction::RequestRevision => "request_revision",
            ReviewAction::Approve => "approve",
            ReviewAction::EditDraft => "edit_draft",
            ReviewAction::Publish => "publish",
        }
    }

    /// Whether staff or the owning client drives this step
    pub const fn is_staff_action(&self) -> bool {
        matches!(
            self,
            ReviewAction::UploadDraft | ReviewAction::ReviseDraft | ReviewAction::Publish
        )
    }
}

impl fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of an order, interpreted by its task type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderState {
    Review(ReviewStatus),
    Generic(String),
}

impl OrderState {
    pub fn parse(task_type: TaskType, status: &str) -> Result<Self, TransitionError> {
        if task_type.is_review() {
            status.parse().map(OrderState::Review)
        } else {
            Ok(OrderState::Generic(status.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            OrderState::Review(s) => s.as_str(),
            OrderState::Generic(s) => s,
        }
    }
}

/// Rejected status change
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("'{from}' 상태에서는 '{action}' 작업을 할 수 없습니다")]
    Illegal {
        from: ReviewStatus,
        action: ReviewAction,
    },

    #[error("리뷰 주문이 아닙니다")]
    NotReviewOrder,

    #[error("리뷰 주문의 상태는 직접 변경할 수 없습니다")]
    ReviewStatusLocked,

    #[error("알 수 없는 주문 상태입니다: {0}")]
    UnknownStatus(String),
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        let message = err.to_string();
        let app = AppError::with_message(ErrorCode::InvalidTransition, message);
        match err {
            TransitionError::Illegal { from, action } => app
                .with_detail("from", from.as_str())
                .with_detail("action", action.as_str()),
            TransitionError::UnknownStatus(status) => app.with_detail("status", status),
            _ => app,
        }
    }
}
