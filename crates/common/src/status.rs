//! Persisted lifecycle statuses for carts and orders.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a status string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} status: {value}")]
pub struct ParseStatusError {
    pub kind: &'static str,
    pub value: String,
}

/// The state of a cart.
///
/// A cart starts `Active` and leaves it exactly once. It is never reused
/// after that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CartStatus {
    /// In-progress selection, lines can be changed.
    #[default]
    Active,

    /// Converted into an order at checkout.
    Submitted,

    /// Abandoned.
    Cancelled,
}

impl CartStatus {
    /// Returns the status as its stored string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CartStatus::Active => "active",
            CartStatus::Submitted => "submitted",
            CartStatus::Cancelled => "cancelled",
        }
    }

    /// Returns true while lines may still be modified.
    pub fn is_active(&self) -> bool {
        matches!(self, CartStatus::Active)
    }
}

impl std::fmt::Display for CartStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CartStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(CartStatus::Active),
            "submitted" => Ok(CartStatus::Submitted),
            "cancelled" => Ok(CartStatus::Cancelled),
            other => Err(ParseStatusError {
                kind: "cart",
                value: other.to_string(),
            }),
        }
    }
}

/// The state of a fulfillment order.
///
/// ```text
/// Pending ──► Preparing ──► Ready ──► PickedUp
///    │            │           │
///    └────────────┴───────────┴──► Cancelled
/// ```
///
/// Which moves are legal is decided by the domain's transition table, not
/// here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Submitted by the shopper, not yet picked up by staff.
    #[default]
    Pending,

    /// Staff are packing the order.
    Preparing,

    /// Packed and waiting for pickup.
    Ready,

    /// Collected by the shopper (terminal).
    PickedUp,

    /// Cancelled (terminal).
    Cancelled,
}

impl OrderStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::PickedUp,
        OrderStatus::Cancelled,
    ];

    /// Returns the status as its stored string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::PickedUp => "picked_up",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Returns true if no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::PickedUp | OrderStatus::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError {
                kind: "order",
                value: s.to_string(),
            })
    }
}
