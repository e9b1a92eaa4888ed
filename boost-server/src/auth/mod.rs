//! Session authentication and login rate limiting

pub mod rate_limit;
pub mod session;

pub use rate_limit::RateLimiter;
pub use session::{CurrentUser, require_staff, session_auth_middleware};
