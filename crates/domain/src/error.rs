//! Domain error types.

use common::{CartId, CartItemId, ItemId, OrderId, OrderStatus};
use store::StoreError;
use thiserror::Error;

/// Coarse classification of a [`DomainError`], used by callers to pick a
/// user-facing response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The referenced item, cart, line or order does not exist.
    NotFound,
    /// The request itself is malformed (e.g. a non-positive quantity).
    InvalidInput,
    /// The request conflicts with current state (stock, status, emptiness).
    StateConflict,
    /// The requester does not own the resource and is not an admin.
    Unauthorized,
    /// The backing store failed; passed through uninterpreted.
    Store,
}

/// Errors that can occur during cart and order operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The item does not exist.
    #[error("Item not found: {item_id}")]
    ItemNotFound { item_id: ItemId },

    /// The item exists but is flagged unavailable.
    #[error("Item no longer available: {name}")]
    ItemUnavailable { item_id: ItemId, name: String },

    /// Not enough stock for the requested (cumulative) quantity.
    #[error("Insufficient quantity for {name}: requested {requested}, available {available}")]
    InsufficientStock {
        item_id: ItemId,
        name: String,
        requested: i32,
        available: i32,
    },

    /// Quantity outside the accepted range.
    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity { quantity: i32 },

    /// The user has no active cart.
    #[error("No active cart found")]
    NoActiveCart,

    /// The cart does not exist.
    #[error("Cart not found: {0}")]
    CartNotFound(CartId),

    /// The line is not part of the user's active cart.
    #[error("Cart item not found in your cart: {0}")]
    CartItemNotFound(CartItemId),

    /// Checkout was attempted on a cart without lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The requested status change is not in the transition table.
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Staff cannot be assigned to a finished order.
    #[error("Cannot assign staff to {status} order")]
    CannotAssign { status: OrderStatus },

    /// The requester may not act on this order.
    #[error("Unauthorized to {action} this order")]
    Unauthorized { action: &'static str },

    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl DomainError {
    /// Returns the error's taxonomy bucket.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::ItemNotFound { .. }
            | DomainError::CartNotFound(_)
            | DomainError::CartItemNotFound(_)
            | DomainError::OrderNotFound(_)
            | DomainError::NoActiveCart => ErrorKind::NotFound,
            DomainError::InvalidQuantity { .. } => ErrorKind::InvalidInput,
            DomainError::ItemUnavailable { .. }
            | DomainError::InsufficientStock { .. }
            | DomainError::EmptyCart
            | DomainError::InvalidTransition { .. }
            | DomainError::CannotAssign { .. } => ErrorKind::StateConflict,
            DomainError::Unauthorized { .. } => ErrorKind::Unauthorized,
            DomainError::Store(_) => ErrorKind::Store,
        }
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
