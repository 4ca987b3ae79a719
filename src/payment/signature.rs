//! Razorpay checkout signature
//!
//! `razorpay_signature = hex(hmac_sha256(key_secret, "{order_id}|{payment_id}"))`

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

fn checkout_mac(key_secret: &str, order_id: &str, payment_id: &str) -> Result<HmacSha256, AppError> {
    let mut mac = HmacSha256::new_from_slice(key_secret.as_bytes())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid Razorpay key secret: {e}")))?;
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    Ok(mac)
}

fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn decode_hex(input: &str) -> Option<Vec<u8>> {
    if input.len() % 2 != 0 || !input.is_ascii() {
        return None;
    }
    (0..input.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&input[i..i + 2], 16).ok())
        .collect()
}

/// Signature Razorpay's checkout returns for a successful payment
pub fn checkout_signature(
    key_secret: &str,
    order_id: &str,
    payment_id: &str,
) -> Result<String, AppError> {
    let mac = checkout_mac(key_secret, order_id, payment_id)?;
    Ok(encode_hex(&mac.finalize().into_bytes()))
}

/// Verify a checkout signature in constant time
///
/// # Errors
/// `AppError::InvalidSignature` on any mismatch or malformed signature
pub fn verify_checkout_signature(
    key_secret: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> Result<(), AppError> {
    let expected = decode_hex(signature.trim()).ok_or(AppError::InvalidSignature)?;
    checkout_mac(key_secret, order_id, payment_id)?
        .verify_slice(&expected)
        .map_err(|_| AppError::InvalidSignature)
}
