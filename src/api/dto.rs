//! API response DTOs
//!
//! Public views of catalog rows. Storage paths never leave the server,
//! file URLs of paid materials are only handed out through downloads,
//! and correct answers stay hidden until an attempt is submitted.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::data::{Exam, Influencer, InfluencerStats, Material, Question, Test, TestAttempt};

/// Price shown to buyers; free items always read 0
fn display_price(price: i64, is_free: bool) -> i64 {
    if is_free { 0 } else { price }
}

/// Material response
#[derive(Debug, Clone, Serialize)]
pub struct MaterialResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub subject_id: Option<String>,
    pub exam: Exam,
    pub price: i64,
    pub is_free: bool,
    pub has_file: bool,
    pub pdf_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MaterialResponse {
    /// View for students and anonymous visitors
    pub fn public(material: &Material) -> Self {
        let mut response = Self::admin(material);
        response.storage_path = None;
        if !material.is_free {
            response.pdf_url = None;
        }
        response
    }

    /// Full view for the back office
    pub fn admin(material: &Material) -> Self {
        Self {
            id: material.id.clone(),
            title: material.title.clone(),
            description: material.description.clone(),
            subject_id: material.subject_id.clone(),
            exam: material.exam,
            price: display_price(material.price, material.is_free),
            is_free: material.is_free,
            has_file: material.storage_path.is_some(),
            pdf_url: material.pdf_url.clone(),
            storage_path: material.storage_path.clone(),
            created_at: material.created_at,
            updated_at: material.updated_at,
        }
    }
}

/// Question without its answer unless `reveal` is set
#[derive(Debug, Clone, Serialize)]
pub struct QuestionResponse {
    pub prompt: String,
    pub options: Vec<String>,
    pub marks: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_option: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuestionResponse {
    pub fn new(question: &Question, reveal: bool) -> Self {
        Self {
            prompt: question.prompt.clone(),
            options: question.options.clone(),
            marks: question.marks,
            correct_option: reveal.then_some(question.correct_option),
            explanation: question.explanation.clone().filter(|_| reveal),
        }
    }
}

/// Test listing entry
#[derive(Debug, Clone, Serialize)]
pub struct TestSummaryResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub subject_id: Option<String>,
    pub exam: Exam,
    pub duration_minutes: i64,
    pub price: i64,
    pub is_free: bool,
    pub negative_marks: i64,
    pub question_count: usize,
    pub total_marks: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Test> for TestSummaryResponse {
    fn from(test: &Test) -> Self {
        Self {
            id: test.id.clone(),
            title: test.title.clone(),
            description: test.description.clone(),
            subject_id: test.subject_id.clone(),
            exam: test.exam,
            duration_minutes: test.duration_minutes,
            price: display_price(test.price, test.is_free),
            is_free: test.is_free,
            negative_marks: test.negative_marks,
            question_count: test.questions.len(),
            total_marks: test
                .questions
                .iter()
                .fold(0i64, |total, q| total.saturating_add(q.marks)),
            created_at: test.created_at,
            updated_at: test.updated_at,
        }
    }
}

/// Test with its questions
#[derive(Debug, Clone, Serialize)]
pub struct TestDetailResponse {
    #[serde(flatten)]
    pub summary: TestSummaryResponse,
    pub questions: Vec<QuestionResponse>,
}

impl TestDetailResponse {
    pub fn new(test: &Test, reveal_answers: bool) -> Self {
        Self {
            summary: TestSummaryResponse::from(test),
            questions: test
                .questions
                .iter()
                .map(|q| QuestionResponse::new(q, reveal_answers))
                .collect(),
        }
    }
}

/// Submitted attempt with the answer key for review
#[derive(Debug, Clone, Serialize)]
pub struct AttemptDetailResponse {
    #[serde(flatten)]
    pub attempt: TestAttempt,
    pub test_title: String,
    pub questions: Vec<QuestionResponse>,
}

/// Influencer profile with sales totals
#[derive(Debug, Clone, Serialize)]
pub struct InfluencerDashboardResponse {
    #[serde(flatten)]
    pub influencer: Influencer,
    pub stats: InfluencerStats,
}
