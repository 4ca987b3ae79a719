//! Data models
//!
//! Rust structs representing database rows.
//! All models use ULID for IDs, chrono for timestamps and integer paise for money.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Enumerations
// =============================================================================

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
    Influencer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Admin => "admin",
            Self::Influencer => "influencer",
        }
    }
}

/// Target entrance exam
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum Exam {
    Neet,
    Jee,
    /// Content relevant to both exams
    Both,
}

/// Kind of purchasable item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ItemType {
    Material,
    Test,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Material => "material",
            Self::Test => "test",
        }
    }
}

/// Payment order lifecycle: created -> paid | failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum OrderStatus {
    Created,
    Paid,
    Failed,
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    /// Lower-cased, unique
    pub email: String,
    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub target_exam: Option<Exam>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub exam: Exam,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Study material (PDF notes, question banks)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Material {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub subject_id: Option<String>,
    pub exam: Exam,
    /// Price in paise
    pub price: i64,
    pub is_free: bool,
    /// Public URL of the uploaded file
    pub pdf_url: Option<String>,
    /// Object path inside the storage bucket
    pub storage_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Multiple-choice question of a practice test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    pub options: Vec<String>,
    /// Index into `options`
    pub correct_option: usize,
    #[serde(default = "default_question_marks")]
    pub marks: i64,
    #[serde(default)]
    pub explanation: Option<String>,
}

fn default_question_marks() -> i64 {
    4
}

/// Practice exam
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Test {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub subject_id: Option<String>,
    pub exam: Exam,
    pub duration_minutes: i64,
    pub price: i64,
    pub is_free: bool,
    pub questions: Json<Vec<Question>>,
    /// Marks deducted per wrong answer
    pub negative_marks: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filters shared by material and test listings
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
pub struct CatalogFilter {
    pub subject_id: Option<String>,
    pub exam: Option<Exam>,
    pub free: Option<bool>,
}

// =============================================================================
// Test attempts
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TestAttempt {
    pub id: String,
    pub user_id: String,
    pub test_id: String,
    /// Selected option per question, `None` when skipped
    pub answers: Json<Vec<Option<usize>>>,
    pub score: i64,
    pub max_score: i64,
    pub correct_count: i64,
    pub wrong_count: i64,
    pub started_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
}

// =============================================================================
// Payments & purchases
// =============================================================================

/// Local record of a Razorpay order
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentOrder {
    pub id: String,
    pub razorpay_order_id: String,
    pub user_id: String,
    pub item_type: ItemType,
    pub item_id: String,
    /// Amount charged, after discount
    pub amount: i64,
    /// List price before discount
    pub original_amount: i64,
    pub currency: String,
    pub coupon_code: Option<String>,
    pub influencer_id: Option<String>,
    pub status: OrderStatus,
    pub razorpay_payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Purchase {
    pub id: String,
    pub user_id: String,
    pub item_type: ItemType,
    pub item_id: String,
    pub payment_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// Purchase joined with the title of the purchased item
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PurchaseWithItem {
    pub id: String,
    pub item_type: ItemType,
    pub item_id: String,
    /// `None` when the item was deleted after purchase
    pub item_title: Option<String>,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MaterialDownload {
    pub id: String,
    pub user_id: String,
    pub material_id: String,
    pub created_at: DateTime<Utc>,
}

/// Download history row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DownloadWithTitle {
    pub id: String,
    pub material_id: String,
    pub material_title: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Influencers
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Influencer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub coupon_code: String,
    /// 0..=100
    pub discount_percent: i64,
    /// 0..=100
    pub commission_percent: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sale attributed to an influencer's coupon
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InfluencerOrder {
    pub id: String,
    pub influencer_id: String,
    pub payment_order_id: String,
    pub user_id: String,
    pub order_amount: i64,
    pub commission_amount: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct InfluencerStats {
    pub order_count: i64,
    pub total_sales: i64,
    pub total_commission: i64,
}

/// Back-office dashboard counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminStats {
    pub users: i64,
    pub materials: i64,
    pub tests: i64,
    pub purchases: i64,
    /// Sum of purchase amounts in paise
    pub revenue: i64,
}
