//! Cart aggregate and the checkout transition.

mod checkout;
mod commands;
mod service;

pub use commands::{AddToCart, UpdateLineQuantity};
pub use service::CartService;

use common::ItemId;
use store::Item;

use crate::error::{DomainError, Result};

/// Checks that `requested` units of `item` can be put in a cart right now.
///
/// This is a read-time check only; nothing is reserved.
pub(crate) fn ensure_orderable(item_id: ItemId, item: Option<&Item>, requested: i32) -> Result<()> {
    let item = item.ok_or(DomainError::ItemNotFound { item_id })?;

    if !item.is_available {
        return Err(DomainError::ItemUnavailable {
            item_id,
            name: item.name.clone(),
        });
    }

    if item.quantity < requested {
        return Err(DomainError::InsufficientStock {
            item_id,
            name: item.name.clone(),
            requested,
            available: item.quantity,
        });
    }

    Ok(())
}
