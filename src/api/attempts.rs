//! Test attempt endpoints

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::types::Json as SqlJson;

use super::dto::{AttemptDetailResponse, QuestionResponse};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{EntityId, ItemType, Role, TestAttempt};
use crate::error::AppError;
use crate::metrics::TEST_ATTEMPTS_TOTAL;
use crate::service::{ensure_access, score_attempt};

#[derive(Debug, Deserialize)]
pub struct SubmitAttemptRequest {
    pub test_id: String,
    /// Selected option index per question, `null` for skipped
    pub answers: Vec<Option<usize>>,
    pub started_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct AttemptListQuery {
    pub test_id: Option<String>,
}

/// POST /api/test-attempts
pub async fn submit_attempt(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<SubmitAttemptRequest>,
) -> Result<(StatusCode, Json<TestAttempt>), AppError> {
    let test = state
        .db
        .get_test(&req.test_id)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_access(&state.db, &user, ItemType::Test, &test.id, test.is_free).await?;

    let score = score_attempt(&test.questions, &req.answers, test.negative_marks)?;

    let submitted_at = Utc::now();
    let attempt = TestAttempt {
        id: EntityId::new().0,
        user_id: user.id.clone(),
        test_id: test.id.clone(),
        answers: SqlJson(req.answers),
        score: score.score,
        max_score: score.max_score,
        correct_count: score.correct_count,
        wrong_count: score.wrong_count,
        started_at: req.started_at.unwrap_or(submitted_at).min(submitted_at),
        submitted_at,
    };
    state.db.insert_test_attempt(&attempt).await?;

    TEST_ATTEMPTS_TOTAL.inc();
    tracing::info!(
        attempt_id = %attempt.id,
        user_id = %user.id,
        test_id = %test.id,
        score = attempt.score,
        max_score = attempt.max_score,
        "Test attempt submitted"
    );

    Ok((StatusCode::CREATED, Json(attempt)))
}

/// GET /api/test-attempts
///
/// Query: optional `test_id`
pub async fn list_attempts(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<AttemptListQuery>,
) -> Result<Json<Vec<TestAttempt>>, AppError> {
    let attempts = state
        .db
        .list_test_attempts_for_user(&user.id, query.test_id.as_deref())
        .await?;
    Ok(Json(attempts))
}

/// GET /api/test-attempts/:id
///
/// Visible to its owner and to admins; everyone else gets 404.
pub async fn get_attempt(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<AttemptDetailResponse>, AppError> {
    let attempt = state
        .db
        .get_test_attempt(&id)
        .await?
        .filter(|attempt| attempt.user_id == user.id || user.role == Role::Admin)
        .ok_or(AppError::NotFound)?;

    // Attempts are removed together with their test
    let test = state
        .db
        .get_test(&attempt.test_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let questions = test
        .questions
        .iter()
        .map(|q| QuestionResponse::new(q, true))
        .collect();

    Ok(Json(AttemptDetailResponse {
        attempt,
        test_title: test.title,
        questions,
    }))
}
