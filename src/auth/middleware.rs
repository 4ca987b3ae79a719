//! Authentication extractors and middleware
//!
//! Protects routes that require a signed-in user or an admin.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, State},
    http::{HeaderMap, Request, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use super::session::verify_session_token;
use crate::AppState;
use crate::data::{Role, User};
use crate::error::AppError;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(ToOwned::to_owned)
        .or_else(|| {
            let jar = CookieJar::from_headers(headers);
            jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_owned())
        })
}

/// Verify the token and load the live user row
async fn authenticate_token(token: &str, state: &AppState) -> Result<User, AppError> {
    let session = verify_session_token(token, &state.config.auth.session_secret)?;
    state
        .db
        .get_user(&session.user_id)
        .await?
        .ok_or(AppError::Unauthorized)
}

async fn user_from_parts(parts: &mut Parts, state: &AppState) -> Result<User, AppError> {
    if let Some(user) = parts.extensions.get::<User>().cloned() {
        return Ok(user);
    }

    let token = extract_token_from_headers(&parts.headers).ok_or(AppError::Unauthorized)?;
    let user = authenticate_token(&token, state).await?;
    parts.extensions.insert(user.clone());
    Ok(user)
}

/// Middleware restricting a router to admins
///
/// # Usage
/// ```ignore
/// let protected_routes = Router::new()
///     .route("/metrics", ...)
///     .layer(middleware::from_fn_with_state(state, require_admin));
/// ```
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token_from_headers(request.headers()).ok_or(AppError::Unauthorized)?;
    let user = authenticate_token(&token, &state).await?;
    if user.role != Role::Admin {
        return Err(AppError::Forbidden);
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Extractor for the signed-in user
///
/// # Usage
/// ```ignore
/// async fn handler(CurrentUser(user): CurrentUser) -> impl IntoResponse {
///     format!("Hello, {}", user.name)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        Ok(CurrentUser(user_from_parts(parts, &state).await?))
    }
}

/// Extractor for a signed-in admin
///
/// Anonymous callers get 401, other roles 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let user = user_from_parts(parts, &state).await?;
        if user.role != Role::Admin {
            return Err(AppError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}

/// Extractor for routes open to everyone that show more to signed-in users
///
/// Missing or invalid credentials yield `None` instead of a rejection.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
    pub fn is_admin(&self) -> bool {
        self.0.as_ref().is_some_and(|user| user.role == Role::Admin)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        match user_from_parts(parts, &state).await {
            Ok(user) => Ok(MaybeUser(Some(user))),
            Err(AppError::Unauthorized) => Ok(MaybeUser(None)),
            Err(error) => Err(error),
        }
    }
}
