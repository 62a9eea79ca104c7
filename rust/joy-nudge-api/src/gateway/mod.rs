//! Request gateway: bearer authentication and per-user rate limiting.

pub mod auth;
pub mod rate_limit;

pub use auth::{AuthenticatedUser, auth_middleware};
pub use rate_limit::{UserRateLimiters, user_rate_limit_middleware};
