//! User management endpoints

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;

use crate::AppState;
use crate::auth::{AdminUser, CurrentUser};
use crate::data::{Exam, Role, User};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub role: Option<Role>,
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    /// `null` clears the target exam
    #[serde(default, deserialize_with = "super::double_option")]
    pub target_exam: Option<Option<Exam>>,
    /// Admin only
    pub role: Option<Role>,
}

/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.db.list_users(query.role).await?))
}

/// GET /api/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    if caller.id != id && caller.role != Role::Admin {
        return Err(AppError::Forbidden);
    }
    let user = state.db.get_user(&id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(user))
}

/// PATCH /api/users/:id
///
/// Users may edit their own name and target exam; admins may edit anyone,
/// including the role.
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<User>, AppError> {
    let is_admin = caller.role == Role::Admin;
    if caller.id != id && !is_admin {
        return Err(AppError::Forbidden);
    }
    if req.role.is_some() && !is_admin {
        return Err(AppError::Forbidden);
    }

    let mut user = state.db.get_user(&id).await?.ok_or(AppError::NotFound)?;

    if let Some(name) = req.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("name must not be empty".to_string()));
        }
        user.name = name.to_string();
    }
    if let Some(target_exam) = req.target_exam {
        user.target_exam = target_exam;
    }
    if let Some(role) = req.role {
        if user.id == caller.id && role != Role::Admin {
            return Err(AppError::Validation(
                "Admins cannot remove their own admin role".to_string(),
            ));
        }
        user.role = role;
    }
    user.updated_at = Utc::now();

    if !state.db.update_user(&user).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(
        user_id = %user.id,
        updated_by = %caller.id,
        role = user.role.as_str(),
        "User updated"
    );
    Ok(Json(user))
}

/// DELETE /api/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if admin.id == id {
        return Err(AppError::Validation(
            "You cannot delete your own account".to_string(),
        ));
    }
    if !state.db.delete_user(&id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(user_id = %id, deleted_by = %admin.id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}
