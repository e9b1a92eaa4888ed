//! Point Charge Model
//!
//! Two-state approval queue: a client requests points, staff resolves the
//! request exactly once. Approval credits `users.points` by the requested
//! amount; the billed `amount` includes 10% VAT.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AppError, ErrorCode};

/// Smallest chargeable request
pub const MIN_CHARGE_POINTS: i64 = 1000;

/// Largest single request
pub const MAX_CHARGE_POINTS: i64 = 100_000_000;

/// Billed amount for `points`: `round(points * 1.1)` in integer arithmetic.
///
/// `None` when the product does not fit in `i64`.
pub const fn charge_amount(points: i64) -> Option<i64> {
    match points.checked_mul(11) {
        Some(scaled) => match scaled.checked_add(5) {
            Some(rounded) => Some(rounded / 10),
            None => None,
        },
        None => None,
    }
}

/// Charge status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChargeStatus {
    Pending,
    Approved,
    Rejected,
}

impl ChargeStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ChargeStatus::Pending => "pending",
            ChargeStatus::Approved => "approved",
            ChargeStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ChargeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for ChargeStatus {
    type Error = PointChargeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(ChargeStatus::Pending),
            "approved" => Ok(ChargeStatus::Approved),
            "rejected" => Ok(ChargeStatus::Rejected),
            _ => Err(PointChargeError::UnknownStatus(value)),
        }
    }
}

/// Terminal outcome chosen by staff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChargeDecision {
    Approved,
    Rejected,
}

impl From<ChargeDecision> for ChargeStatus {
    fn from(d: ChargeDecision) -> Self {
        match d {
            ChargeDecision::Approved => ChargeStatus::Approved,
            ChargeDecision::Rejected => ChargeStatus::Rejected,
        }
    }
}

/// Point charge request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct PointCharge {
    pub id: i64,
    pub client_id: i64,
    pub points: i64,
    pub amount: i64,
    #[cfg_attr(feature = "db", sqlx(try_from = "String"))]
    pub status: ChargeStatus,
    pub admin_id: Option<i64>,
    pub admin_note: Option<String>,
    pub approved_at: Option<i64>,
    pub resolved_at: Option<i64>,
    pub created_at: i64,
}

impl PointCharge {
    /// Validate a client request and build the pending record
    pub fn new_request(id: i64, client_id: i64, points: i64, now: i64) -> Result<Self, PointChargeError> {
        if points < MIN_CHARGE_POINTS {
            return Err(PointChargeError::BelowMinimum(points));
        }
        if points > MAX_CHARGE_POINTS {
            return Err(PointChargeError::AboveMaximum(points));
        }
        let amount = charge_amount(points).ok_or(PointChargeError::AboveMaximum(points))?;
        Ok(Self {
            id,
            client_id,
            points,
            amount,
            status: ChargeStatus::Pending,
            admin_id: None,
            admin_note: None,
            approved_at: None,
            resolved_at: None,
            created_at: now,
        })
    }

    /// Resolve exactly once. Returns the points to credit (0 on rejection).
    ///
    /// On error the record is unchanged.
    pub fn resolve(
        &mut self,
        decision: ChargeDecision,
        admin_id: i64,
        note: Option<String>,
        now: i64,
    ) -> Result<i64, PointChargeError> {
        if self.status != ChargeStatus::Pending {
            return Err(PointChargeError::AlreadyResolved(self.status));
        }
        self.status = decision.into();
        self.admin_id = Some(admin_id);
        self.admin_note = note.filter(|n| !n.trim().is_empty());
        self.resolved_at = Some(now);
        match decision {
            ChargeDecision::Approved => {
                self.approved_at = Some(now);
                Ok(self.points)
            }
            ChargeDecision::Rejected => Ok(0),
        }
    }
}

/// `POST /points/charge` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeRequest {
    pub points: i64,
}

/// `PATCH /points/charges/:id` body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveChargeRequest {
    pub status: ChargeDecision,
    #[serde(default)]
    pub admin_note: Option<String>,
}

/// `GET /points/charges` query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeQuery {
    pub status: Option<ChargeStatus>,
    pub client_id: Option<i64>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Point charge errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PointChargeError {
    #[error("최소 충전 포인트는 {MIN_CHARGE_POINTS}P 입니다 (요청 {0}P)")]
    BelowMinimum(i64),

    #[error("1회 최대 충전 포인트는 {MAX_CHARGE_POINTS}P 입니다 (요청 {0}P)")]
    AboveMaximum(i64),

    #[error("이미 처리된 충전 요청입니다 ({0})")]
    AlreadyResolved(ChargeStatus),

    #[error("알 수 없는 충전 상태입니다: {0}")]
    UnknownStatus(String),
}

impl From<PointChargeError> for AppError {
    fn from(err: PointChargeError) -> Self {
        let message = err.to_string();
        match err {
            PointChargeError::BelowMinimum(points) => {
                AppError::with_message(ErrorCode::PointsBelowMinimum, message)
                    .with_detail("points", points)
                    .with_detail("minimum", MIN_CHARGE_POINTS)
            }
            PointChargeError::AboveMaximum(points) => {
                AppError::with_message(ErrorCode::ValidationFailed, message)
                    .with_detail("points", points)
                    .with_detail("maximum", MAX_CHARGE_POINTS)
            }
            PointChargeError::AlreadyResolved(status) => {
                AppError::with_message(ErrorCode::AlreadyResolved, message)
                    .with_detail("status", status.as_str())
            }
            PointChargeError::UnknownStatus(_) => AppError::internal(message),
        }
    }
}
