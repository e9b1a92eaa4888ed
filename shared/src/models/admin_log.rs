//! Admin Activity Log Model
//!
//! Append-only. Targets are weak references by id: deleting the target leaves
//! its log entries in place.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Privileged action kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
    UserCreate,
    UserUpdate,
    UserDelete,
    UserBlock,
    UserUnblock,
    QuotaUpdate,
    OrderStatusUpdate,
    OrderDraftUpload,
    OrderPublish,
    OrderDelete,
    OrderImport,
    PointChargeApprove,
    PointChargeReject,
    CredentialView,
    CredentialUpdate,
}

impl AdminAction {
    pub const ALL: [AdminAction; 15] = [
        AdminAction::UserCreate,
        AdminAction::UserUpdate,
        AdminAction::UserDelete,
        AdminAction::UserBlock,
        AdminAction::UserUnblock,
        AdminAction::QuotaUpdate,
        AdminAction::OrderStatusUpdate,
        AdminAction::OrderDraftUpload,
        AdminAction::OrderPublish,
        AdminAction::OrderDelete,
        AdminAction::OrderImport,
        AdminAction::PointChargeApprove,
        AdminAction::PointChargeReject,
        AdminAction::CredentialView,
        AdminAction::CredentialUpdate,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            AdminAction::UserCreate => "user_create",
            AdminAction::UserUpdate => "user_update",
            AdminAction::UserDelete => "user_delete",
            AdminAction::UserBlock => "user_block",
            AdminAction::UserUnblock => "user_unblock",
            AdminAction::QuotaUpdate => "quota_update",
            AdminAction::OrderStatusUpdate => "order_status_update",
            AdminAction::OrderDraftUpload => "order_draft_upload",
            AdminAction::OrderPublish => "order_publish",
            AdminAction::OrderDelete => "order_delete",
            AdminAction::OrderImport => "order_import",
            AdminAction::PointChargeApprove => "point_charge_approve",
            AdminAction::PointChargeReject => "point_charge_reject",
            AdminAction::CredentialView => "credential_view",
            AdminAction::CredentialUpdate => "credential_update",
        }
    }

    /// Entity kind the action targets
    pub const fn target_type(&self) -> TargetType {
        match self {
            AdminAction::UserCreate
            | AdminAction::UserUpdate
            | AdminAction::UserDelete
            | AdminAction::UserBlock
            | AdminAction::UserUnblock
            | AdminAction::QuotaUpdate
            | AdminAction::CredentialView
            | AdminAction::CredentialUpdate => TargetType::User,
            AdminAction::OrderStatusUpdate
            | AdminAction::OrderDraftUpload
            | AdminAction::OrderPublish
            | AdminAction::OrderDelete
            | AdminAction::OrderImport => TargetType::Order,
            AdminAction::PointChargeApprove | AdminAction::PointChargeReject => {
                TargetType::PointCharge
            }
        }
    }
}

impl fmt::Display for AdminAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned for a stored value outside the known set
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown audit value: {0}")]
pub struct UnknownAuditValue(pub String);

impl TryFrom<String> for AdminAction {
    type Error = UnknownAuditValue;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        AdminAction::ALL
            .into_iter()
            .find(|a| a.as_str() == value)
            .ok_or(UnknownAuditValue(value))
    }
}

/// Kind of entity an audit entry points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    User,
    Order,
    PointCharge,
}

impl TargetType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TargetType::User => "user",
            TargetType::Order => "order",
            TargetType::PointCharge => "point_charge",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for TargetType {
    type Error = UnknownAuditValue;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "user" => Ok(TargetType::User),
            "order" => Ok(TargetType::Order),
            "point_charge" => Ok(TargetType::PointCharge),
            _ => Err(UnknownAuditValue(value)),
        }
    }
}

/// Stored audit entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct AdminActivityLog {
    pub id: i64,
    pub admin_id: i64,
    pub admin_username: String,
    #[cfg_attr(feature = "db", sqlx(try_from = "String"))]
    pub action: AdminAction,
    #[serde(rename = "target_type")]
    #[cfg_attr(feature = "db", sqlx(try_from = "String"))]
    pub target_type: TargetType,
    pub target_id: Option<i64>,
    /// Free-form structured payload
    pub details: serde_json::Value,
    #[serde(rename = "ip_address")]
    pub ip_address: Option<String>,
    #[serde(rename = "user_agent")]
    pub user_agent: Option<String>,
    pub created_at: i64,
}

/// `GET /admin/logs` query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminLogQuery {
    pub admin_id: Option<i64>,
    pub action: Option<AdminAction>,
    pub target_type: Option<TargetType>,
    /// Inclusive lower bound (unix millis)
    pub from: Option<i64>,
    /// Inclusive upper bound (unix millis)
    pub to: Option<i64>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}
