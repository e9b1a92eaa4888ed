//! Task types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, ErrorCode};
use crate::models::QuotaCategory;

/// Kind of work an order requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Follower,
    Like,
    Hotpost,
    Momcafe,
    Powerblog,
    Clip,
    BlogReview,
    ReceiptReview,
    Myexpense,
    Experience,
    Daangn,
}

impl TaskType {
    pub const ALL: [TaskType; 11] = [
        TaskType::Follower,
        TaskType::Like,
        TaskType::Hotpost,
        TaskType::Momcafe,
        TaskType::Powerblog,
        TaskType::Clip,
        TaskType::BlogReview,
        TaskType::ReceiptReview,
        TaskType::Myexpense,
        TaskType::Experience,
        TaskType::Daangn,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            TaskType::Follower => "follower",
            TaskType::Like => "like",
            TaskType::Hotpost => "hotpost",
            TaskType::Momcafe => "momcafe",
            TaskType::Powerblog => "powerblog",
            TaskType::Clip => "clip",
            TaskType::BlogReview => "blog_review",
            TaskType::ReceiptReview => "receipt_review",
            TaskType::Myexpense => "myexpense",
            TaskType::Experience => "experience",
            TaskType::Daangn => "daangn",
        }
    }

    /// Ledger category debited when an order of this type is created
    pub const fn quota_category(&self) -> QuotaCategory {
        match self {
            TaskType::Follower => QuotaCategory::Follower,
            TaskType::Like => QuotaCategory::Like,
            TaskType::Hotpost => QuotaCategory::Hotpost,
            TaskType::Momcafe => QuotaCategory::Momcafe,
            TaskType::Powerblog => QuotaCategory::Powerblog,
            TaskType::Clip => QuotaCategory::Clip,
            TaskType::BlogReview => QuotaCategory::Blog,
            TaskType::ReceiptReview => QuotaCategory::Receipt,
            TaskType::Myexpense => QuotaCategory::Myexpense,
            TaskType::Experience => QuotaCategory::Experience,
            TaskType::Daangn => QuotaCategory::Daangn,
        }
    }

    /// Blog and receipt reviews run the draft workflow
    pub const fn is_review(&self) -> bool {
        matches!(self, TaskType::BlogReview | TaskType::ReceiptReview)
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned for a task type string outside the fixed set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("지원하지 않는 작업 유형입니다: {0}")]
pub struct UnsupportedTaskType(pub String);

impl From<UnsupportedTaskType> for AppError {
    fn from(err: UnsupportedTaskType) -> Self {
        let message = err.to_string();
        AppError::with_message(ErrorCode::UnsupportedTaskType, message).with_detail("taskType", err.0)
    }
}

impl FromStr for TaskType {
    type Err = UnsupportedTaskType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnsupportedTaskType(s.to_string()))
    }
}

impl TryFrom<String> for TaskType {
    type Error = UnsupportedTaskType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
