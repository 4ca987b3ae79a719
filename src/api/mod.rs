//! API layer
//!
//! HTTP handlers for:
//! - Catalog (subjects, materials, tests)
//! - Test attempts and material downloads
//! - Payments and coupons
//! - Back office (users, influencers, stats)
//! - Metrics (Prometheus)

mod admin;
mod attempts;
mod downloads;
mod dto;
mod influencers;
mod materials;
pub mod metrics;
mod payment;
mod subjects;
mod users;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use serde::{Deserialize, Deserializer};

use crate::AppState;
use crate::error::AppError;

pub use dto::*;
pub use metrics::{metrics_router, track_http_metrics};

/// Create the `/api` router
///
/// Authentication is enforced per handler by the `CurrentUser` and
/// `AdminUser` extractors.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(crate::auth::auth_router())
        // Catalog
        .route(
            "/subjects",
            get(subjects::list_subjects).post(subjects::create_subject),
        )
        .route(
            "/subjects/:id",
            axum::routing::put(subjects::update_subject).delete(subjects::delete_subject),
        )
        .route(
            "/materials",
            get(materials::list_materials).post(materials::create_material),
        )
        .route(
            "/materials/:id",
            get(materials::get_material)
                .put(materials::update_material)
                .delete(materials::delete_material),
        )
        .route("/materials/:id/file", post(materials::upload_material_file))
        .route(
            "/tests",
            get(practice_tests::list_tests).post(practice_tests::create_test),
        )
        .route(
            "/tests/:id",
            get(practice_tests::get_test)
                .put(practice_tests::update_test)
                .delete(practice_tests::delete_test),
        )
        // Learning
        .route(
            "/test-attempts",
            get(attempts::list_attempts).post(attempts::submit_attempt),
        )
        .route("/test-attempts/:id", get(attempts::get_attempt))
        .route(
            "/material-downloads",
            get(downloads::list_downloads).post(downloads::create_download),
        )
        // Payments
        .route("/payment/create-order", post(payment::create_order))
        .route("/payment/verify", post(payment::verify_payment))
        .route("/payment/my-purchases", get(payment::my_purchases))
        .route("/coupons/:code", get(payment::get_coupon))
        // Back office
        .route("/users", get(users::list_users))
        .route(
            "/users/:id",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/influencer/admin",
            get(influencers::list_influencers).post(influencers::create_influencer),
        )
        .route(
            "/influencer/admin/:id",
            axum::routing::put(influencers::update_influencer)
                .delete(influencers::delete_influencer),
        )
        .route(
            "/influencer/admin/:id/orders",
            get(influencers::influencer_orders),
        )
        .route("/influencer/me", get(influencers::my_dashboard))
        .route("/admin/stats", get(admin::stats))
        .route_layer(middleware::from_fn(track_http_metrics))
}

// =============================================================================
// Shared request validation
// =============================================================================

/// Trim optional text, mapping blank strings to `None`
pub(crate) fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Highest accepted price, in paise (10 crore rupees)
pub(crate) const MAX_PRICE: i64 = 10_000_000_000;

/// Check a price; free items are stored with price 0
///
/// # Returns
/// (price, is_free)
pub(crate) fn validate_pricing(price: i64, is_free: bool) -> Result<(i64, bool), AppError> {
    if price < 0 {
        return Err(AppError::Validation("price must not be negative".to_string()));
    }
    if price > MAX_PRICE {
        return Err(AppError::Validation(format!(
            "price must not exceed {MAX_PRICE} paise"
        )));
    }
    if is_free {
        return Ok((0, true));
    }
    if price == 0 {
        return Err(AppError::Validation(
            "paid items need a price above zero".to_string(),
        ));
    }
    Ok((price, false))
}

pub(crate) fn validate_percent(field: &str, value: i64) -> Result<i64, AppError> {
    if !(0..=100).contains(&value) {
        return Err(AppError::Validation(format!(
            "{field} must be between 0 and 100"
        )));
    }
    Ok(value)
}

/// Ensure an optional subject reference points at an existing subject
pub(crate) async fn validate_subject(
    state: &AppState,
    subject_id: Option<String>,
) -> Result<Option<String>, AppError> {
    let Some(subject_id) = normalize_optional_text(subject_id) else {
        return Ok(None);
    };
    if state.db.get_subject(&subject_id).await?.is_none() {
        return Err(AppError::Validation("Unknown subject_id".to_string()));
    }
    Ok(Some(subject_id))
}

/// Distinguish an absent field from an explicit `null`
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
