//! Cart commands.

use common::{CartItemId, ItemId, PantryId};
use serde::Deserialize;

/// Command to add units of an item to the user's active cart.
#[derive(Debug, Clone, Deserialize)]
pub struct AddToCart {
    /// Pantry the cart is opened at, if a new cart has to be created.
    pub pantry_id: PantryId,

    /// The item to add.
    pub item_id: ItemId,

    /// Units to add; must be at least 1.
    pub quantity: i32,
}

impl AddToCart {
    /// Creates a new AddToCart command.
    pub fn new(pantry_id: PantryId, item_id: ItemId, quantity: i32) -> Self {
        Self {
            pantry_id,
            item_id,
            quantity,
        }
    }
}

/// Command to overwrite the quantity of a cart line.
///
/// A quantity of 0 removes the line.
#[derive(Debug, Clone)]
pub struct UpdateLineQuantity {
    /// The line to change.
    pub cart_item_id: CartItemId,

    /// The new quantity.
    pub quantity: i32,
}

impl UpdateLineQuantity {
    /// Creates a new UpdateLineQuantity command.
    pub fn new(cart_item_id: CartItemId, quantity: i32) -> Self {
        Self {
            cart_item_id,
            quantity,
        }
    }
}
