//! Study material endpoints

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;

use super::dto::MaterialResponse;
use crate::AppState;
use crate::auth::{AdminUser, MaybeUser};
use crate::data::{CatalogFilter, EntityId, Exam, Material};
use crate::error::AppError;

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Deserialize)]
pub struct MaterialRequest {
    pub title: String,
    pub description: Option<String>,
    pub subject_id: Option<String>,
    pub exam: Exam,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub is_free: bool,
}

/// Validated material fields
struct MaterialFields {
    title: String,
    description: Option<String>,
    subject_id: Option<String>,
    exam: Exam,
    price: i64,
    is_free: bool,
}

async fn validate_request(
    state: &AppState,
    req: MaterialRequest,
) -> Result<MaterialFields, AppError> {
    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }
    let (price, is_free) = super::validate_pricing(req.price, req.is_free)?;
    let subject_id = super::validate_subject(state, req.subject_id).await?;

    Ok(MaterialFields {
        title,
        description: super::normalize_optional_text(req.description),
        subject_id,
        exam: req.exam,
        price,
        is_free,
    })
}

fn material_view(viewer: &MaybeUser, material: &Material) -> MaterialResponse {
    if viewer.is_admin() {
        MaterialResponse::admin(material)
    } else {
        MaterialResponse::public(material)
    }
}

/// GET /api/materials
///
/// Query: `subject_id`, `exam` (`NEET`/`JEE`, `BOTH` items always match), `free`
pub async fn list_materials(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Query(filter): Query<CatalogFilter>,
) -> Result<Json<Vec<MaterialResponse>>, AppError> {
    let materials = state
        .catalog_cache
        .materials(&filter, state.db.list_materials(&filter))
        .await?;

    Ok(Json(
        materials.iter().map(|m| material_view(&viewer, m)).collect(),
    ))
}

/// GET /api/materials/:id
pub async fn get_material(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<String>,
) -> Result<Json<MaterialResponse>, AppError> {
    let material = state.db.get_material(&id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(material_view(&viewer, &material)))
}

/// POST /api/materials
pub async fn create_material(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(req): Json<MaterialRequest>,
) -> Result<(StatusCode, Json<MaterialResponse>), AppError> {
    let fields = validate_request(&state, req).await?;
    let now = Utc::now();
    let material = Material {
        id: EntityId::new().0,
        title: fields.title,
        description: fields.description,
        subject_id: fields.subject_id,
        exam: fields.exam,
        price: fields.price,
        is_free: fields.is_free,
        pdf_url: None,
        storage_path: None,
        created_at: now,
        updated_at: now,
    };
    state.db.insert_material(&material).await?;
    state.catalog_cache.invalidate();

    tracing::info!(material_id = %material.id, admin_id = %admin.id, "Material created");
    Ok((StatusCode::CREATED, Json(MaterialResponse::admin(&material))))
}

/// PUT /api/materials/:id
pub async fn update_material(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    Json(req): Json<MaterialRequest>,
) -> Result<Json<MaterialResponse>, AppError> {
    let mut material = state.db.get_material(&id).await?.ok_or(AppError::NotFound)?;
    let fields = validate_request(&state, req).await?;

    material.title = fields.title;
    material.description = fields.description;
    material.subject_id = fields.subject_id;
    material.exam = fields.exam;
    material.price = fields.price;
    material.is_free = fields.is_free;
    material.updated_at = Utc::now();

    if !state.db.update_material(&material).await? {
        return Err(AppError::NotFound);
    }
    state.catalog_cache.invalidate();

    tracing::info!(material_id = %material.id, "Material updated");
    Ok(Json(MaterialResponse::admin(&material)))
}

/// DELETE /api/materials/:id
///
/// Also removes the stored file; a storage failure is logged, not fatal.
pub async fn delete_material(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let material = state.db.get_material(&id).await?.ok_or(AppError::NotFound)?;
    if !state.db.delete_material(&id).await? {
        return Err(AppError::NotFound);
    }
    state.catalog_cache.invalidate();

    if let Some(path) = material.storage_path.as_deref() {
        if let Err(error) = state.storage.delete(path).await {
            tracing::warn!(%error, material_id = %id, path, "Failed to delete material file");
        }
    }

    tracing::info!(material_id = %id, "Material deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/materials/:id/file
///
/// Multipart upload with a single `file` field holding a PDF.
/// Replaces any previous file.
pub async fn upload_material_file(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<MaterialResponse>, AppError> {
    let mut material = state.db.get_material(&id).await?.ok_or(AppError::NotFound)?;

    let mut file_data: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to parse multipart: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read file: {}", e)))?;
        file_data = Some(bytes.to_vec());
    }

    let data = file_data.ok_or_else(|| AppError::Validation("file is required".to_string()))?;
    if !data.starts_with(PDF_MAGIC) {
        return Err(AppError::Validation("Only PDF files are accepted".to_string()));
    }
    let size = data.len();

    let previous_path = material.storage_path.take();
    let (path, url) = state.storage.upload_material_pdf(&material.id, data).await?;
    material.storage_path = Some(path);
    material.pdf_url = Some(url);
    material.updated_at = Utc::now();

    if !state.db.update_material(&material).await? {
        return Err(AppError::NotFound);
    }
    state.catalog_cache.invalidate();

    if let Some(previous) = previous_path.as_deref() {
        if let Err(error) = state.storage.delete(previous).await {
            tracing::warn!(%error, path = previous, "Failed to delete replaced material file");
        }
    }

    tracing::info!(material_id = %material.id, size, "Material file uploaded");
    Ok(Json(MaterialResponse::admin(&material)))
}
