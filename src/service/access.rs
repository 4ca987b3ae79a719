//! Content entitlements
//!
//! A user may open an item when it is free, when they bought it,
//! or when they are an admin.

use crate::data::{Database, ItemType, Role, User};
use crate::error::AppError;

/// Price-relevant view of a catalog item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedItem {
    pub item_type: ItemType,
    pub id: String,
    pub title: String,
    /// Paise
    pub price: i64,
    pub is_free: bool,
}

impl PricedItem {
    /// Free items and zero-priced items need no payment
    pub fn is_free(&self) -> bool {
        self.is_free || self.price <= 0
    }
}

/// Load a material or test by type and id
pub async fn load_item(
    db: &Database,
    item_type: ItemType,
    item_id: &str,
) -> Result<Option<PricedItem>, AppError> {
    let item = match item_type {
        ItemType::Material => db.get_material(item_id).await?.map(|m| PricedItem {
            item_type,
            id: m.id,
            title: m.title,
            price: m.price,
            is_free: m.is_free,
        }),
        ItemType::Test => db.get_test(item_id).await?.map(|t| PricedItem {
            item_type,
            id: t.id,
            title: t.title,
            price: t.price,
            is_free: t.is_free,
        }),
    };

    Ok(item)
}

/// Check whether `user` may open an item
pub async fn has_access(
    db: &Database,
    user: &User,
    item_type: ItemType,
    item_id: &str,
    is_free: bool,
) -> Result<bool, AppError> {
    if is_free || user.role == Role::Admin {
        return Ok(true);
    }
    db.has_purchase(&user.id, item_type, item_id).await
}

/// Like [`has_access`], failing with `Forbidden`
pub async fn ensure_access(
    db: &Database,
    user: &User,
    item_type: ItemType,
    item_id: &str,
    is_free: bool,
) -> Result<(), AppError> {
    if has_access(db, user, item_type, item_id, is_free).await? {
        Ok(())
    } else {
        tracing::debug!(
            user_id = %user.id,
            item_type = item_type.as_str(),
            item_id,
            "Access denied to unpurchased item"
        );
        Err(AppError::Forbidden)
    }
}
