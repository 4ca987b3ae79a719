//! Checkout service
//!
//! Creates Razorpay orders for catalog items and records purchases once
//! the checkout signature has been verified.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use super::access::load_item;
use crate::data::{
    Database, EntityId, Influencer, InfluencerOrder, ItemType, OrderStatus, PaymentOrder, Purchase,
    User,
};
use crate::error::AppError;
use crate::metrics::{ORDERS_CREATED_TOTAL, PAYMENTS_VERIFIED_TOTAL, PURCHASES_TOTAL};
use crate::payment::RazorpayClient;

/// `amount * percent / 100` without intermediate overflow
///
/// `percent` is clamped to `0..=100`, so the result never exceeds `amount`.
fn percent_of(amount: i64, percent: i64) -> i64 {
    let share = i128::from(amount) * i128::from(percent.clamp(0, 100)) / 100;
    // |share| <= |amount|
    share as i64
}

/// Price after an influencer discount, in paise
pub fn discounted_amount(price: i64, discount_percent: i64) -> i64 {
    price - percent_of(price, discount_percent)
}

/// Influencer commission on an order amount, in paise
pub fn commission_amount(order_amount: i64, commission_percent: i64) -> i64 {
    percent_of(order_amount, commission_percent)
}

/// Checkout parameters handed to the client-side widget
#[derive(Debug, Clone, Serialize)]
pub struct CreatedOrder {
    /// Local order id
    pub order_id: String,
    pub razorpay_order_id: String,
    /// Amount to charge, in paise
    pub amount: i64,
    pub original_amount: i64,
    pub discount_percent: i64,
    pub currency: String,
    /// Public Razorpay key id
    pub key_id: String,
    pub item_title: String,
}

/// Result of a successful verification
#[derive(Debug, Clone, Serialize)]
pub struct VerifiedPayment {
    pub order_id: String,
    pub item_type: ItemType,
    pub item_id: String,
    /// `None` when the item had already been purchased
    pub purchase: Option<Purchase>,
    pub already_purchased: bool,
}

pub struct CheckoutService {
    db: Arc<Database>,
    razorpay: Arc<RazorpayClient>,
}

impl CheckoutService {
    pub fn new(db: Arc<Database>, razorpay: Arc<RazorpayClient>) -> Self {
        Self { db, razorpay }
    }

    /// Resolve a coupon to an active influencer
    ///
    /// Blank codes mean "no coupon".
    async fn resolve_coupon(&self, coupon_code: Option<&str>) -> Result<Option<Influencer>, AppError> {
        let Some(code) = coupon_code.map(str::trim).filter(|c| !c.is_empty()) else {
            return Ok(None);
        };

        match self.db.get_influencer_by_coupon(code).await? {
            Some(influencer) if influencer.is_active => Ok(Some(influencer)),
            _ => Err(AppError::Validation("Invalid coupon code".to_string())),
        }
    }

    /// Create a payment order for one catalog item
    ///
    /// # Errors
    /// - `NotFound` when the item does not exist
    /// - `Validation` for free items and unknown or inactive coupons
    /// - `Conflict` when the user already owns the item
    /// - `PaymentGateway` when Razorpay rejects the order
    pub async fn create_order(
        &self,
        user: &User,
        item_type: ItemType,
        item_id: &str,
        coupon_code: Option<&str>,
    ) -> Result<CreatedOrder, AppError> {
        let item = load_item(&self.db, item_type, item_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if item.is_free() {
            return Err(AppError::Validation(
                "This item is free and does not need to be purchased".to_string(),
            ));
        }
        if self.db.has_purchase(&user.id, item_type, &item.id).await? {
            return Err(AppError::Conflict("Item already purchased".to_string()));
        }

        let influencer = self.resolve_coupon(coupon_code).await?;
        let discount_percent = influencer.as_ref().map_or(0, |i| i.discount_percent);
        let amount = discounted_amount(item.price, discount_percent);
        if amount <= 0 {
            return Err(AppError::Validation(
                "Discounted amount must be greater than zero".to_string(),
            ));
        }

        let order_id = EntityId::new().0;
        let notes = serde_json::json!({
            "user_id": user.id,
            "item_type": item_type.as_str(),
            "item_id": item.id,
            "coupon_code": influencer.as_ref().map(|i| i.coupon_code.as_str()),
        });
        let razorpay_order = self.razorpay.create_order(amount, &order_id, notes).await?;

        let now = Utc::now();
        let order = PaymentOrder {
            id: order_id,
            razorpay_order_id: razorpay_order.id,
            user_id: user.id.clone(),
            item_type,
            item_id: item.id.clone(),
            amount,
            original_amount: item.price,
            currency: razorpay_order.currency,
            coupon_code: influencer.as_ref().map(|i| i.coupon_code.clone()),
            influencer_id: influencer.as_ref().map(|i| i.id.clone()),
            status: OrderStatus::Created,
            razorpay_payment_id: None,
            created_at: now,
            updated_at: now,
        };
        self.db.insert_payment_order(&order).await?;

        ORDERS_CREATED_TOTAL
            .with_label_values(&[item_type.as_str()])
            .inc();
        tracing::info!(
            order_id = %order.id,
            razorpay_order_id = %order.razorpay_order_id,
            user_id = %user.id,
            item_type = item_type.as_str(),
            item_id = %order.item_id,
            amount,
            coupon = ?order.coupon_code,
            "Payment order created"
        );

        Ok(CreatedOrder {
            order_id: order.id,
            razorpay_order_id: order.razorpay_order_id,
            amount,
            original_amount: item.price,
            discount_percent,
            currency: order.currency,
            key_id: self.razorpay.key_id().to_string(),
            item_title: item.title,
        })
    }

    /// Verify a checkout and record the purchase
    ///
    /// # Errors
    /// - `Validation` when an identifier is blank
    /// - `NotFound` for unknown orders and orders of other users
    /// - `InvalidSignature` when the signature does not match; the order
    ///   is marked failed
    pub async fn verify_payment(
        &self,
        user: &User,
        razorpay_order_id: &str,
        razorpay_payment_id: &str,
        razorpay_signature: &str,
    ) -> Result<VerifiedPayment, AppError> {
        let razorpay_order_id = razorpay_order_id.trim();
        let razorpay_payment_id = razorpay_payment_id.trim();
        let razorpay_signature = razorpay_signature.trim();
        if razorpay_order_id.is_empty()
            || razorpay_payment_id.is_empty()
            || razorpay_signature.is_empty()
        {
            return Err(AppError::Validation(
                "razorpay_order_id, razorpay_payment_id and razorpay_signature are required"
                    .to_string(),
            ));
        }

        let order = self
            .db
            .get_payment_order_by_razorpay_id(razorpay_order_id)
            .await?
            .filter(|order| order.user_id == user.id)
            .ok_or(AppError::NotFound)?;

        if let Err(error) =
            self.razorpay
                .verify_payment(razorpay_order_id, razorpay_payment_id, razorpay_signature)
        {
            self.db.mark_payment_order_failed(&order.id).await?;
            PAYMENTS_VERIFIED_TOTAL
                .with_label_values(&["invalid_signature"])
                .inc();
            tracing::warn!(
                order_id = %order.id,
                user_id = %user.id,
                "Payment signature rejected"
            );
            return Err(error);
        }

        let already_purchased = order.status == OrderStatus::Paid
            || self
                .db
                .has_purchase(&user.id, order.item_type, &order.item_id)
                .await?;
        if already_purchased {
            PAYMENTS_VERIFIED_TOTAL
                .with_label_values(&["already_purchased"])
                .inc();
            tracing::info!(order_id = %order.id, "Payment verified for an owned item");
            return Ok(VerifiedPayment {
                order_id: order.id,
                item_type: order.item_type,
                item_id: order.item_id,
                purchase: None,
                already_purchased: true,
            });
        }

        let attribution = self.attribution(&order).await?;
        let purchase = self
            .db
            .record_verified_payment(&order, razorpay_payment_id, attribution.as_ref())
            .await?;

        PAYMENTS_VERIFIED_TOTAL.with_label_values(&["success"]).inc();
        if purchase.is_some() {
            PURCHASES_TOTAL
                .with_label_values(&[order.item_type.as_str()])
                .inc();
        }
        tracing::info!(
            order_id = %order.id,
            user_id = %user.id,
            item_id = %order.item_id,
            amount = order.amount,
            influencer_id = ?order.influencer_id,
            recorded = purchase.is_some(),
            "Payment verified"
        );

        Ok(VerifiedPayment {
            already_purchased: purchase.is_none(),
            order_id: order.id,
            item_type: order.item_type,
            item_id: order.item_id,
            purchase,
        })
    }

    /// Commission row for an order placed with a coupon
    async fn attribution(&self, order: &PaymentOrder) -> Result<Option<InfluencerOrder>, AppError> {
        let Some(influencer_id) = order.influencer_id.as_deref() else {
            return Ok(None);
        };
        let Some(influencer) = self.db.get_influencer(influencer_id).await? else {
            tracing::warn!(
                order_id = %order.id,
                influencer_id,
                "Influencer removed before payment; skipping commission"
            );
            return Ok(None);
        };

        Ok(Some(InfluencerOrder {
            id: EntityId::new().0,
            influencer_id: influencer.id,
            payment_order_id: order.id.clone(),
            user_id: order.user_id.clone(),
            order_amount: order.amount,
            commission_amount: commission_amount(order.amount, influencer.commission_percent),
            created_at: Utc::now(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discount_is_deducted_from_list_price() {
        assert_eq!(discounted_amount(49_900, 0), 49_900);
        assert_eq!(discounted_amount(49_900, 10), 44_910);
        assert_eq!(discounted_amount(999, 15), 850);
        assert_eq!(discounted_amount(10_000, 100), 0);
    }

    #[test]
    fn commission_is_percentage_of_charged_amount() {
        assert_eq!(commission_amount(44_910, 20), 8_982);
        assert_eq!(commission_amount(999, 10), 99);
        assert_eq!(commission_amount(50_000, 0), 0);
    }

    #[test]
    fn large_amounts_do_not_overflow() {
        let price = 1_000_000_000_000_000_000;
        assert_eq!(discounted_amount(price, 10), 900_000_000_000_000_000);
        assert_eq!(commission_amount(i64::MAX, 100), i64::MAX);
        assert_eq!(discounted_amount(i64::MAX, 0), i64::MAX);
    }
}
