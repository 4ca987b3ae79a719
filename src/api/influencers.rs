//! Influencer endpoints
//!
//! Back-office management of influencers and their coupons, plus the
//! influencer's own dashboard.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;

use super::dto::InfluencerDashboardResponse;
use crate::AppState;
use crate::auth::{AdminUser, CurrentUser, normalize_email};
use crate::data::{EntityId, Influencer, InfluencerOrder, Role};
use crate::error::AppError;
use crate::service::{normalize_coupon_code, unique_coupon_code};

#[derive(Debug, Deserialize)]
pub struct CreateInfluencerRequest {
    pub name: String,
    pub email: String,
    /// Generated from the name when absent
    pub coupon_code: Option<String>,
    pub discount_percent: i64,
    pub commission_percent: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Deserialize)]
pub struct UpdateInfluencerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub coupon_code: Option<String>,
    pub discount_percent: Option<i64>,
    pub commission_percent: Option<i64>,
    pub is_active: Option<bool>,
}

fn validated_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    Ok(name.to_string())
}

/// GET /api/influencer/admin
pub async fn list_influencers(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<Influencer>>, AppError> {
    Ok(Json(state.db.list_influencers().await?))
}

/// POST /api/influencer/admin
pub async fn create_influencer(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(req): Json<CreateInfluencerRequest>,
) -> Result<(StatusCode, Json<Influencer>), AppError> {
    let name = validated_name(&req.name)?;
    let email = normalize_email(&req.email)?;
    let discount_percent = super::validate_percent("discount_percent", req.discount_percent)?;
    let commission_percent =
        super::validate_percent("commission_percent", req.commission_percent)?;

    let coupon_code = match req.coupon_code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => {
            let code = normalize_coupon_code(code)?;
            if state.db.coupon_code_exists(&code).await? {
                return Err(AppError::Conflict("Coupon code already exists".to_string()));
            }
            code
        }
        _ => unique_coupon_code(&state.db, &name).await?,
    };

    let now = Utc::now();
    let influencer = Influencer {
        id: EntityId::new().0,
        name,
        email,
        coupon_code,
        discount_percent,
        commission_percent,
        is_active: req.is_active,
        created_at: now,
        updated_at: now,
    };
    state.db.insert_influencer(&influencer).await?;

    tracing::info!(
        influencer_id = %influencer.id,
        coupon_code = %influencer.coupon_code,
        admin_id = %admin.id,
        "Influencer created"
    );
    Ok((StatusCode::CREATED, Json(influencer)))
}

/// PUT /api/influencer/admin/:id
pub async fn update_influencer(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateInfluencerRequest>,
) -> Result<Json<Influencer>, AppError> {
    let mut influencer = state
        .db
        .get_influencer(&id)
        .await?
        .ok_or(AppError::NotFound)?;

    if let Some(name) = req.name {
        influencer.name = validated_name(&name)?;
    }
    if let Some(email) = req.email {
        influencer.email = normalize_email(&email)?;
    }
    if let Some(code) = req.coupon_code {
        influencer.coupon_code = normalize_coupon_code(&code)?;
    }
    if let Some(percent) = req.discount_percent {
        influencer.discount_percent = super::validate_percent("discount_percent", percent)?;
    }
    if let Some(percent) = req.commission_percent {
        influencer.commission_percent = super::validate_percent("commission_percent", percent)?;
    }
    if let Some(is_active) = req.is_active {
        influencer.is_active = is_active;
    }
    influencer.updated_at = Utc::now();

    if !state.db.update_influencer(&influencer).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(influencer_id = %influencer.id, "Influencer updated");
    Ok(Json(influencer))
}

/// DELETE /api/influencer/admin/:id
///
/// Past orders keep their coupon code; commission rows go with the influencer.
pub async fn delete_influencer(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.db.delete_influencer(&id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(influencer_id = %id, "Influencer deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/influencer/admin/:id/orders
pub async fn influencer_orders(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<InfluencerOrder>>, AppError> {
    if state.db.get_influencer(&id).await?.is_none() {
        return Err(AppError::NotFound);
    }
    Ok(Json(state.db.list_influencer_orders(&id).await?))
}

/// GET /api/influencer/me
///
/// The influencer profile is matched to the signed-in user by e-mail.
pub async fn my_dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<InfluencerDashboardResponse>, AppError> {
    if user.role != Role::Influencer {
        return Err(AppError::Forbidden);
    }

    let influencer = state
        .db
        .get_influencer_by_email(&user.email)
        .await?
        .ok_or(AppError::NotFound)?;
    let stats = state.db.influencer_stats(&influencer.id).await?;

    Ok(Json(InfluencerDashboardResponse { influencer, stats }))
}
