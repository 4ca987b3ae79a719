//! Admin dashboard endpoints

use axum::{Json, extract::State};
use chrono::{Duration, Utc};
use serde::Serialize;

use crate::AppState;
use crate::auth::AdminUser;
use crate::data::AdminStats;
use crate::error::AppError;

const RECENT_REVENUE_DAYS: i64 = 30;

/// Dashboard counters
#[derive(Debug, Serialize)]
pub struct AdminStatsResponse {
    #[serde(flatten)]
    pub totals: AdminStats,
    /// Paise
    pub revenue_last_30_days: i64,
}

/// GET /api/admin/stats
pub async fn stats(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<AdminStatsResponse>, AppError> {
    let totals = state.db.admin_stats().await?;
    let revenue_last_30_days = state
        .db
        .revenue_since(Utc::now() - Duration::days(RECENT_REVENUE_DAYS))
        .await?;

    Ok(Json(AdminStatsResponse {
        totals,
        revenue_last_30_days,
    }))
}
