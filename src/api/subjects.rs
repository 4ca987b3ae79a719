//! Subject endpoints

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;

use crate::AppState;
use crate::auth::AdminUser;
use crate::data::{EntityId, Exam, Subject};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct SubjectRequest {
    pub name: String,
    pub exam: Exam,
    pub description: Option<String>,
}

fn validated_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    Ok(name.to_string())
}

/// GET /api/subjects
pub async fn list_subjects(State(state): State<AppState>) -> Result<Json<Vec<Subject>>, AppError> {
    let subjects = state
        .catalog_cache
        .subjects(state.db.list_subjects())
        .await?;
    Ok(Json(subjects.as_ref().clone()))
}

/// POST /api/subjects
pub async fn create_subject(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(req): Json<SubjectRequest>,
) -> Result<(StatusCode, Json<Subject>), AppError> {
    let subject = Subject {
        id: EntityId::new().0,
        name: validated_name(&req.name)?,
        exam: req.exam,
        description: super::normalize_optional_text(req.description),
        created_at: Utc::now(),
    };
    state.db.insert_subject(&subject).await?;
    state.catalog_cache.invalidate();

    tracing::info!(subject_id = %subject.id, admin_id = %admin.id, "Subject created");
    Ok((StatusCode::CREATED, Json(subject)))
}

/// PUT /api/subjects/:id
pub async fn update_subject(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    Json(req): Json<SubjectRequest>,
) -> Result<Json<Subject>, AppError> {
    let mut subject = state.db.get_subject(&id).await?.ok_or(AppError::NotFound)?;
    subject.name = validated_name(&req.name)?;
    subject.exam = req.exam;
    subject.description = super::normalize_optional_text(req.description);

    if !state.db.update_subject(&subject).await? {
        return Err(AppError::NotFound);
    }
    state.catalog_cache.invalidate();

    tracing::info!(subject_id = %subject.id, "Subject updated");
    Ok(Json(subject))
}

/// DELETE /api/subjects/:id
///
/// Materials and tests of the subject are kept, unassigned.
pub async fn delete_subject(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.db.delete_subject(&id).await? {
        return Err(AppError::NotFound);
    }
    state.catalog_cache.invalidate();

    tracing::info!(subject_id = %id, "Subject deleted");
    Ok(StatusCode::NO_CONTENT)
}
