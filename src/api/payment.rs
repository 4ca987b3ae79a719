//! Payment and coupon endpoints

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{ItemType, PurchaseWithItem};
use crate::error::AppError;
use crate::service::{CreatedOrder, VerifiedPayment};

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub item_type: ItemType,
    pub item_id: String,
    pub coupon_code: Option<String>,
}

/// Fields posted back by the Razorpay checkout widget
///
/// Missing fields deserialize as empty and are rejected with 400.
#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    #[serde(default)]
    pub razorpay_order_id: String,
    #[serde(default)]
    pub razorpay_payment_id: String,
    #[serde(default)]
    pub razorpay_signature: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    #[serde(flatten)]
    pub payment: VerifiedPayment,
}

#[derive(Debug, Serialize)]
pub struct CouponResponse {
    pub code: String,
    pub discount_percent: i64,
}

/// POST /api/payment/create-order
pub async fn create_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<CreatedOrder>, AppError> {
    let order = state
        .checkout
        .create_order(
            &user,
            req.item_type,
            req.item_id.trim(),
            req.coupon_code.as_deref(),
        )
        .await?;
    Ok(Json(order))
}

/// POST /api/payment/verify
pub async fn verify_payment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>, AppError> {
    let payment = state
        .checkout
        .verify_payment(
            &user,
            &req.razorpay_order_id,
            &req.razorpay_payment_id,
            &req.razorpay_signature,
        )
        .await?;

    Ok(Json(VerifyPaymentResponse {
        success: true,
        payment,
    }))
}

/// GET /api/payment/my-purchases
pub async fn my_purchases(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<PurchaseWithItem>>, AppError> {
    let purchases = state.db.list_purchases_for_user(&user.id).await?;
    Ok(Json(purchases))
}

/// GET /api/coupons/:code
///
/// Unknown and inactive coupons are both 404.
pub async fn get_coupon(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<CouponResponse>, AppError> {
    let influencer = state
        .db
        .get_influencer_by_coupon(code.trim())
        .await?
        .filter(|influencer| influencer.is_active)
        .ok_or(AppError::NotFound)?;

    Ok(Json(CouponResponse {
        code: influencer.coupon_code,
        discount_percent: influencer.discount_percent,
    }))
}
