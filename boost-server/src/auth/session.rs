//! Session tokens and request authentication
//!
//! A session is an HS256 JWT carrying `{id, username, role}`, delivered as an
//! HttpOnly cookie named `session` (30 days). An `Authorization: Bearer`
//! header is accepted as well.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http::{HeaderMap, HeaderValue, header};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::Role;

use super::rate_limit::extract_ip;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session";

const SESSION_DAYS: i64 = 30;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub id: i64,
    pub username: String,
    pub role: Role,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated caller, inserted into request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl CurrentUser {
    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.role.is_staff() {
            Ok(())
        } else {
            Err(AppError::new(ErrorCode::AdminRequired))
        }
    }

    pub fn require_superadmin(&self) -> Result<(), AppError> {
        if self.role.is_superadmin() {
            Ok(())
        } else {
            Err(AppError::new(ErrorCode::SuperadminRequired))
        }
    }

    pub fn require_client(&self) -> Result<(), AppError> {
        if self.role == Role::Client {
            Ok(())
        } else {
            Err(AppError::forbidden("클라이언트 계정만 이용할 수 있습니다"))
        }
    }
}

/// Create a session token
pub fn create_token(
    id: i64,
    username: &str,
    role: Role,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = SessionClaims {
        id,
        username: username.to_string(),
        role,
        exp: (now + chrono::Duration::days(SESSION_DAYS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verify a session token
pub fn decode_token(token: &str, secret: &str) -> Result<SessionClaims, AppError> {
    jsonwebtoken::decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!("JWT validation failed: {e}");
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::token_expired(),
            _ => AppError::invalid_token("Invalid session token"),
        }
    })
}

/// `Set-Cookie` value carrying a fresh session
pub fn session_cookie(token: &str, secure: bool) -> Result<HeaderValue, AppError> {
    let max_age = SESSION_DAYS * 24 * 60 * 60;
    let mut cookie =
        format!("{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
        .map_err(|e| AppError::internal(format!("Invalid session cookie: {e}")))
}

/// `Set-Cookie` value that removes the session
pub fn clear_session_cookie(secure: bool) -> HeaderValue {
    if secure {
        HeaderValue::from_static("session=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0; Secure")
    } else {
        HeaderValue::from_static("session=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
    }
}

/// Token from the `session` cookie, else from a Bearer header
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string());

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    })
}

/// Middleware that verifies the session and inserts [`CurrentUser`]
///
/// The account is re-read on every request so blocked or deleted users lose
/// access immediately.
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(request.headers()).ok_or_else(AppError::unauthorized)?;
    let claims = decode_token(&token, &state.jwt_secret)?;

    let user = state
        .users
        .find_by_id(claims.id)
        .await?
        .ok_or_else(|| AppError::invalid_token("Account no longer exists"))?;
    if !user.is_active {
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }

    let current = CurrentUser {
        id: user.id,
        username: user.username,
        role: user.role,
        ip_address: extract_ip(&request),
        user_agent: request
            .headers()
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };
    request.extensions_mut().insert(current);

    Ok(next.run(request).await)
}

/// Middleware gate for staff-only route groups (runs after session auth)
pub async fn require_staff(request: Request, next: Next) -> Result<Response, AppError> {
    request
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(AppError::unauthorized)?
        .require_staff()?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_token_roundtrip() {
        let token = create_token(42, "staff", Role::Admin, SECRET).unwrap();
        let claims = decode_token(&token, SECRET).unwrap();
        assert_eq!(claims.id, 42);
        assert_eq!(claims.username, "staff");
        assert_eq!(claims.role, Role::Admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_token(42, "staff", Role::Admin, SECRET).unwrap();
        let err = decode_token(&token, "other").unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenInvalid);
    }

    #[test]
    fn test_expired_token() {
        let claims = SessionClaims {
            id: 1,
            username: "c".into(),
            role: Role::Client,
            exp: 1_000,
            iat: 0,
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert_eq!(
            decode_token(&token, SECRET).unwrap_err().code,
            ErrorCode::TokenExpired
        );
    }

    #[test]
    fn test_token_from_cookie_or_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; session=abc.def"));
        assert_eq!(session_token(&headers).as_deref(), Some("abc.def"));

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(session_token(&headers).as_deref(), Some("xyz"));

        assert_eq!(session_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = session_cookie("tok", true).unwrap();
        let s = cookie.to_str().unwrap();
        assert!(s.starts_with("session=tok;"));
        assert!(s.contains("HttpOnly"));
        assert!(s.contains("Max-Age=2592000"));
        assert!(s.ends_with("Secure"));
        let plain = session_cookie("tok", false).unwrap();
        assert!(!plain.to_str().unwrap().contains("Secure"));
    }

    #[test]
    fn test_cookie_rejects_unencodable_token() {
        let err = session_cookie("tok\nSet-Cookie: x=1", false).unwrap_err();
        assert_eq!(err.code, ErrorCode::InternalError);
    }
}
