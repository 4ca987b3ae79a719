//! Sign-up, sign-in and sign-out endpoints

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::middleware::{CurrentUser, SESSION_COOKIE};
use super::password::{hash_password, validate_password, verify_password};
use super::session::{Session, create_session_token};
use crate::AppState;
use crate::data::{EntityId, Exam, Role, User};
use crate::error::AppError;

/// Create authentication router
///
/// Routes:
/// - POST /auth/register - Create a student account
/// - POST /auth/login - Sign in
/// - GET /auth/me - Current user
/// - POST /auth/logout - Clear the session cookie
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/auth/logout", post(logout))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub target_exam: Option<Exam>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Trim and lower-case an e-mail, rejecting obviously invalid ones
pub fn normalize_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_ascii_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(AppError::Validation("a valid email is required".to_string()));
    }
    Ok(email)
}

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.should_use_secure_cookies())
        .build()
}

fn start_session(state: &AppState, user: &User) -> Result<String, AppError> {
    let session = Session::for_user(user, state.config.auth.session_max_age);
    create_session_token(&session, &state.config.auth.session_secret)
}

/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    let email = normalize_email(&req.email)?;
    validate_password(&req.password)?;

    if state.db.get_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let now = Utc::now();
    let user = User {
        id: EntityId::new().0,
        name: name.to_string(),
        email,
        password_hash: hash_password(&req.password).await?,
        role: Role::Student,
        target_exam: req.target_exam,
        created_at: now,
        updated_at: now,
    };
    state.db.insert_user(&user).await?;

    crate::metrics::USERS_REGISTERED_TOTAL.inc();
    tracing::info!(user_id = %user.id, "User registered");

    let token = start_session(&state, &user)?;
    let jar = jar.add(session_cookie(&state, token.clone()));

    Ok((StatusCode::CREATED, jar, Json(AuthResponse { token, user })))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = req.email.trim().to_ascii_lowercase();
    state.login_throttle.check(&email).await?;

    let user = state.db.get_user_by_email(&email).await?;
    let verified = match &user {
        Some(user) => verify_password(&req.password, &user.password_hash).await?,
        None => false,
    };

    let user = match user {
        Some(user) if verified => user,
        _ => {
            state.login_throttle.record_failure(&email).await;
            tracing::info!(email = %email, "Rejected sign-in");
            return Err(AppError::Unauthorized);
        }
    };
    state.login_throttle.reset(&email).await;

    let token = start_session(&state, &user)?;
    let jar = jar.add(session_cookie(&state, token.clone()));
    tracing::info!(user_id = %user.id, "User signed in");

    Ok((jar, Json(AuthResponse { token, user })))
}

/// GET /api/auth/me
async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

/// POST /api/auth/logout
///
/// Always answers with an expired `session` cookie, whether or not the
/// request carried one.
async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let mut cleared = session_cookie(&state, String::new());
    cleared.make_removal();
    (jar.add(cleared), Json(serde_json::json!({ "success": true })))
}
