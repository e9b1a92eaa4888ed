//! HTTP routes for boost-server

pub mod auth;
pub mod health;
pub mod logs;
pub mod orders;
pub mod points;
pub mod users;

use axum::routing::{get, patch, post, put};
use axum::{Router, middleware};
use shared::error::AppError;
use tower_http::trace::TraceLayer;

use crate::auth::rate_limit::login_rate_limit;
use crate::auth::{require_staff, session_auth_middleware};
use crate::state::AppState;

pub type ApiResult<T> = Result<axum::Json<T>, AppError>;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Login (rate limited per IP)
    let login = Router::new()
        .route("/auth/login", post(auth::login))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            login_rate_limit,
        ));

    // Staff only
    let staff = Router::new()
        .route("/orders/blog-receipt", post(orders::import_link))
        .route("/orders/blog-receipt/bulk", post(orders::import_bulk))
        .route("/points/charges", get(points::list))
        .route("/points/charges/{id}", patch(points::resolve))
        .route("/admin/logs", get(logs::query))
        .route("/admin/users", get(users::list).post(users::create))
        .route(
            "/admin/users/{id}",
            get(users::get).patch(users::update).delete(users::delete),
        )
        .route("/admin/users/{id}/quota", put(users::set_quota))
        .route("/admin/users/{id}/block", post(users::block))
        .route("/admin/users/{id}/unblock", post(users::unblock))
        .route(
            "/admin/users/{id}/credentials",
            get(users::get_credentials).put(users::put_credentials),
        )
        .layer(middleware::from_fn(require_staff));

    // Any signed-in account; services apply the finer role rules
    let authenticated = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/orders", get(orders::list).post(orders::create))
        .route("/orders/review-request", post(orders::create_review))
        .route(
            "/orders/{id}",
            get(orders::get).patch(orders::patch).delete(orders::delete),
        )
        .route("/points/charge", post(points::request))
        .route("/points/charges/my", get(points::list_mine))
        .merge(staff)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_auth_middleware,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/auth/logout", post(auth::logout))
        .merge(login)
        .merge(authenticated)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
