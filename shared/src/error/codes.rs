//! Unified error codes for boost-desk
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Account errors
//! - 4xxx: Order and quota errors
//! - 5xxx: Point charge errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so the admin console and
/// client portal can switch on them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Too many requests from the same origin
    TooManyRequests = 9,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (username/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is disabled (blocked by an admin)
    AccountDisabled = 1007,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Admin role required
    AdminRequired = 2003,
    /// Superadmin role required
    SuperadminRequired = 2006,

    // ==================== 3xxx: Account ====================
    /// Client account not found
    ClientNotFound = 3001,
    /// Username already taken
    UsernameExists = 3002,
    /// Contract window has ended
    ContractExpired = 3003,
    /// Password too short
    PasswordTooShort = 3004,
    /// No credentials stored for the client
    CredentialsNotFound = 3005,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Status transition not allowed from the current state
    InvalidTransition = 4002,
    /// Not enough remaining quota for the category
    InsufficientQuota = 4003,
    /// Task type not accepted by this endpoint
    UnsupportedTaskType = 4004,

    // ==================== 5xxx: Points ====================
    /// Point charge not found
    PointChargeNotFound = 5001,
    /// Point charge was already approved or rejected
    AlreadyResolved = 5002,
    /// Requested points below the minimum charge
    PointsBelowMinimum = 5003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this code represents success
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Default user-facing message for this code
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::Success => "처리되었습니다",
            ErrorCode::Unknown => "알 수 없는 오류가 발생했습니다",
            ErrorCode::ValidationFailed => "입력값이 올바르지 않습니다",
            ErrorCode::NotFound => "요청한 항목을 찾을 수 없습니다",
            ErrorCode::AlreadyExists => "이미 존재하는 항목입니다",
            ErrorCode::InvalidRequest => "잘못된 요청입니다",
            ErrorCode::TooManyRequests => "요청이 너무 많습니다. 잠시 후 다시 시도해주세요",

            ErrorCode::NotAuthenticated => "로그인이 필요합니다",
            ErrorCode::InvalidCredentials => "아이디 또는 비밀번호가 올바르지 않습니다",
            ErrorCode::TokenExpired => "세션이 만료되었습니다. 다시 로그인해주세요",
            ErrorCode::TokenInvalid => "세션 정보가 올바르지 않습니다",
            ErrorCode::AccountDisabled => "차단된 계정입니다. 담당자에게 문의해주세요",

            ErrorCode::PermissionDenied => "권한이 없습니다",
            ErrorCode::AdminRequired => "관리자만 이용할 수 있습니다",
            ErrorCode::SuperadminRequired => "최고 관리자만 이용할 수 있습니다",

            ErrorCode::ClientNotFound => "클라이언트를 찾을 수 없습니다",
            ErrorCode::UsernameExists => "이미 사용 중인 아이디입니다",
            ErrorCode::ContractExpired => "계약 기간이 종료되었습니다",
            ErrorCode::PasswordTooShort => "비밀번호는 8자 이상이어야 합니다",
            ErrorCode::CredentialsNotFound => "저장된 계정 정보가 없습니다",

            ErrorCode::OrderNotFound => "주문을 찾을 수 없습니다",
            ErrorCode::InvalidTransition => "현재 상태에서는 처리할 수 없는 요청입니다",
            ErrorCode::InsufficientQuota => "잔여 수량이 부족합니다",
            ErrorCode::UnsupportedTaskType => "지원하지 않는 작업 유형입니다",

            ErrorCode::PointChargeNotFound => "충전 요청을 찾을 수 없습니다",
            ErrorCode::AlreadyResolved => "이미 처리된 충전 요청입니다",
            ErrorCode::PointsBelowMinimum => "최소 충전 포인트보다 적습니다",

            ErrorCode::InternalError => "서버 오류가 발생했습니다",
            ErrorCode::DatabaseError => "데이터 처리 중 오류가 발생했습니다",
            ErrorCode::ConfigError => "서버 설정 오류입니다",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code as u16
    }
}

/// Error returned when converting an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            9 => Ok(ErrorCode::TooManyRequests),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1007 => Ok(ErrorCode::AccountDisabled),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2003 => Ok(ErrorCode::AdminRequired),
            2006 => Ok(ErrorCode::SuperadminRequired),

            // Account
            3001 => Ok(ErrorCode::ClientNotFound),
            3002 => Ok(ErrorCode::UsernameExists),
            3003 => Ok(ErrorCode::ContractExpired),
            3004 => Ok(ErrorCode::PasswordTooShort),
            3005 => Ok(ErrorCode::CredentialsNotFound),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::InvalidTransition),
            4003 => Ok(ErrorCode::InsufficientQuota),
            4004 => Ok(ErrorCode::UnsupportedTaskType),

            // Points
            5001 => Ok(ErrorCode::PointChargeNotFound),
            5002 => Ok(ErrorCode::AlreadyResolved),
            5003 => Ok(ErrorCode::PointsBelowMinimum),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
