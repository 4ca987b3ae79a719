//! Influencer coupon codes
//!
//! Generated codes are an upper-case prefix taken from the influencer's
//! name followed by four random digits, e.g. `ASHAVE4821`.

use rand::Rng;

use crate::data::Database;
use crate::error::AppError;

const MAX_PREFIX_LEN: usize = 6;
const FALLBACK_PREFIX: &str = "PREP";
const MAX_GENERATION_ATTEMPTS: usize = 20;
const MAX_CODE_LEN: usize = 20;

/// Prefix derived from a display name
pub fn coupon_prefix(name: &str) -> String {
    let prefix: String = name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(MAX_PREFIX_LEN)
        .collect::<String>()
        .to_ascii_uppercase();

    if prefix.is_empty() {
        FALLBACK_PREFIX.to_string()
    } else {
        prefix
    }
}

/// One candidate code for `name`
pub fn generate_coupon_code<R: Rng + ?Sized>(name: &str, rng: &mut R) -> String {
    format!("{}{:04}", coupon_prefix(name), rng.gen_range(0..10_000))
}

/// Validate and upper-case an admin-supplied code
pub fn normalize_coupon_code(code: &str) -> Result<String, AppError> {
    let code = code.trim().to_ascii_uppercase();
    if code.len() < 3 || code.len() > MAX_CODE_LEN {
        return Err(AppError::Validation(format!(
            "coupon_code must be 3 to {MAX_CODE_LEN} characters"
        )));
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::Validation(
            "coupon_code may only contain letters and digits".to_string(),
        ));
    }
    Ok(code)
}

/// Generate a code that no influencer uses yet
///
/// # Errors
/// `AppError::Internal` when every attempt collided
pub async fn unique_coupon_code(db: &Database, name: &str) -> Result<String, AppError> {
    for _ in 0..MAX_GENERATION_ATTEMPTS {
        let candidate = generate_coupon_code(name, &mut rand::thread_rng());
        if !db.coupon_code_exists(&candidate).await? {
            return Ok(candidate);
        }
        tracing::debug!(candidate = %candidate, "Coupon code collision, retrying");
    }

    Err(AppError::Internal(anyhow::anyhow!(
        "could not generate a unique coupon code for prefix {}",
        coupon_prefix(name)
    )))
}
