//! Razorpay payment gateway
//!
//! Handles:
//! - Order creation over the Razorpay REST API
//! - Checkout signature verification

mod razorpay;
pub mod signature;

pub use razorpay::{RazorpayClient, RazorpayOrder};
pub use signature::{checkout_signature, verify_checkout_signature};
