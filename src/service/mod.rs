//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services orchestrate database, storage and payment gateway calls.

pub mod access;
mod checkout;
pub mod coupon;
pub mod scoring;

pub use access::{PricedItem, ensure_access, has_access, load_item};
pub use checkout::{
    CheckoutService, CreatedOrder, VerifiedPayment, commission_amount, discounted_amount,
};
pub use coupon::{coupon_prefix, normalize_coupon_code, unique_coupon_code};
pub use scoring::{Score, score_attempt};
