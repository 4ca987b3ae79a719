//! Material download endpoints

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{DownloadWithTitle, EntityId, ItemType, MaterialDownload};
use crate::error::AppError;
use crate::metrics::DOWNLOADS_TOTAL;
use crate::service::ensure_access;

const DEFAULT_HISTORY_LIMIT: i64 = 50;
const MAX_HISTORY_LIMIT: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    pub material_id: String,
}

#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    pub download_id: String,
    pub material_id: String,
    pub title: String,
    pub url: String,
    /// Seconds until `url` stops working, `None` for permanent URLs
    pub expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

/// POST /api/material-downloads
///
/// Records the download and returns a URL: the public one for free
/// materials, a short-lived signed one for paid materials.
pub async fn create_download(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<DownloadRequest>,
) -> Result<(StatusCode, Json<DownloadResponse>), AppError> {
    let material = state
        .db
        .get_material(req.material_id.trim())
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_access(
        &state.db,
        &user,
        ItemType::Material,
        &material.id,
        material.is_free,
    )
    .await?;

    let path = material.storage_path.as_deref().ok_or(AppError::NotFound)?;
    let (url, expires_in) = if material.is_free {
        let url = material
            .pdf_url
            .clone()
            .unwrap_or_else(|| state.storage.public_url(path));
        (url, None)
    } else {
        (
            state.storage.create_signed_url(path).await?,
            Some(state.config.storage.signed_url_ttl),
        )
    };

    let download = MaterialDownload {
        id: EntityId::new().0,
        user_id: user.id.clone(),
        material_id: material.id.clone(),
        created_at: Utc::now(),
    };
    state.db.insert_material_download(&download).await?;

    DOWNLOADS_TOTAL.inc();
    tracing::info!(
        download_id = %download.id,
        user_id = %user.id,
        material_id = %material.id,
        signed = expires_in.is_some(),
        "Material download recorded"
    );

    Ok((
        StatusCode::CREATED,
        Json(DownloadResponse {
            download_id: download.id,
            material_id: material.id,
            title: material.title,
            url,
            expires_in,
        }),
    ))
}

/// GET /api/material-downloads
///
/// Query: `limit` (default 50, max 200)
pub async fn list_downloads(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<DownloadWithTitle>>, AppError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let downloads = state.db.list_downloads_for_user(&user.id, limit).await?;
    Ok(Json(downloads))
}
