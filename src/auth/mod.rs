//! Authentication
//!
//! Handles:
//! - E-mail/password sign-up and sign-in
//! - Signed session tokens
//! - Authentication extractors and admin middleware
//! - Failed sign-in throttling

mod middleware;
pub mod password;
mod rate_limit;
mod routes;
pub mod session;

pub use middleware::{AdminUser, CurrentUser, MaybeUser, SESSION_COOKIE, require_admin};
pub use rate_limit::LoginThrottle;
pub use routes::{AuthResponse, auth_router, normalize_email};
pub use session::{Session, create_session_token, verify_session_token};
