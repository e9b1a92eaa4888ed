//! Session endpoints

use axum::{Extension, Json, extract::State, response::IntoResponse};
use http::header;
use shared::error::AppError;
use shared::models::{LoginRequest, LoginResponse, User};

use crate::auth::CurrentUser;
use crate::auth::session::{clear_session_cookie, session_cookie};
use crate::services::users;
use crate::state::AppState;

use super::ApiResult;

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (token, user) = users::login(&state, req).await?;
    let cookie = session_cookie(&token, state.secure_cookies)?;
    Ok(([(header::SET_COOKIE, cookie)], Json(LoginResponse { token, user })))
}

/// POST /auth/logout
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, clear_session_cookie(state.secure_cookies))],
        Json(serde_json::json!({ "success": true })),
    )
}

/// GET /auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(actor): Extension<CurrentUser>,
) -> ApiResult<User> {
    Ok(Json(users::me(&state, &actor).await?))
}
