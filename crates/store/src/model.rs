//! Stored entities.

use chrono::{DateTime, Utc};
use common::{
    CartId, CartItemId, CartStatus, ItemId, OrderId, OrderStatus, PantryId, StaffId, UserId,
};
use serde::{Deserialize, Serialize};

/// Default low-stock threshold for new items.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 10;

/// An inventory item at a pantry.
///
/// The core only reads `quantity` and `is_available`, and only ever adds to
/// `quantity` (when an order is cancelled).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub pantry_id: PantryId,
    pub name: String,
    pub quantity: i32,
    pub low_stock_threshold: i32,
    /// Unit of measure, e.g. "lb", "oz", "count".
    pub unit: String,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Creates an available item with the default threshold and unit.
    pub fn new(pantry_id: PantryId, name: impl Into<String>, quantity: i32) -> Self {
        let now = Utc::now();
        Self {
            id: ItemId::new(),
            pantry_id,
            name: name.into(),
            quantity,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            unit: "count".to_string(),
            is_available: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Marks the item as unavailable.
    pub fn unavailable(mut self) -> Self {
        self.is_available = false;
        self
    }

    /// Returns true if stock is at or below the low-stock threshold.
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.low_stock_threshold
    }
}

/// One (item, quantity) line in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub item_id: ItemId,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartItem {
    /// Creates a new line for a cart.
    pub fn new(cart_id: CartId, item_id: ItemId, quantity: i32) -> Self {
        let now = Utc::now();
        Self {
            id: CartItemId::new(),
            cart_id,
            item_id,
            quantity,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A user's selection at one pantry.
///
/// `items` is populated whenever a cart is loaded from the store, in the
/// order the lines were added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub pantry_id: PantryId,
    pub status: CartStatus,
    #[serde(default)]
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new, empty, active cart.
    pub fn new(user_id: UserId, pantry_id: PantryId) -> Self {
        let now = Utc::now();
        Self {
            id: CartId::new(),
            user_id,
            pantry_id,
            status: CartStatus::Active,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the line with the given id.
    pub fn line(&self, cart_item_id: CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|line| line.id == cart_item_id)
    }

    /// Returns the line holding the given item.
    pub fn line_for_item(&self, item_id: ItemId) -> Option<&CartItem> {
        self.items.iter().find(|line| line.item_id == item_id)
    }

    /// Returns the number of lines.
    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the sum of all line quantities.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|line| i64::from(line.quantity)).sum()
    }
}

/// A submitted cart being fulfilled by pantry staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub cart_id: CartId,
    pub user_id: UserId,
    pub pantry_id: PantryId,
    pub status: OrderStatus,
    pub notes: String,
    pub assigned_to: Option<StaffId>,
    pub submitted_at: DateTime<Utc>,
    pub ready_at: Option<DateTime<Utc>>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Lines of the originating cart, filled in when the order is loaded.
    #[serde(default)]
    pub lines: Vec<CartItem>,
}

impl Order {
    /// Creates a pending order for a cart. Not persisted.
    pub fn new(
        cart_id: CartId,
        user_id: UserId,
        pantry_id: PantryId,
        notes: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            cart_id,
            user_id,
            pantry_id,
            status: OrderStatus::Pending,
            notes: notes.into(),
            assigned_to: None,
            submitted_at: now,
            ready_at: None,
            picked_up_at: None,
            created_at: now,
            updated_at: now,
            lines: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_item_defaults() {
        let item = Item::new(PantryId::new(), "Rice", 12);
        assert!(item.is_available);
        assert_eq!(item.unit, "count");
        assert_eq!(item.low_stock_threshold, DEFAULT_LOW_STOCK_THRESHOLD);
        assert!(!item.is_low_stock());
        assert!(!item.unavailable().is_available);
    }

    #[test]
    fn low_stock_is_inclusive() {
        let mut item = Item::new(PantryId::new(), "Beans", 10);
        assert!(item.is_low_stock());
        item.quantity = 11;
        assert!(!item.is_low_stock());
    }

    #[test]
    fn cart_line_lookup() {
        let mut cart = Cart::new(UserId::new(), PantryId::new());
        let item_id = ItemId::new();
        let line = CartItem::new(cart.id, item_id, 3);
        let line_id = line.id;
        cart.items.push(line);
        cart.items.push(CartItem::new(cart.id, ItemId::new(), 2));

        assert_eq!(cart.line(line_id).map(|l| l.item_id), Some(item_id));
        assert_eq!(cart.line_for_item(item_id).map(|l| l.id), Some(line_id));
        assert_eq!(cart.line_count(), 2);
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn new_order_is_pending_and_unassigned() {
        let order = Order::new(CartId::new(), UserId::new(), PantryId::new(), "leave at door");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.notes, "leave at door");
        assert!(order.assigned_to.is_none());
        assert!(order.ready_at.is_none());
        assert!(order.picked_up_at.is_none());
        assert_eq!(order.submitted_at, order.created_at);
    }

    #[test]
    fn order_deserializes_without_lines() {
        let order = Order::new(CartId::new(), UserId::new(), PantryId::new(), "");
        let mut json = serde_json::to_value(&order).unwrap();
        json.as_object_mut().unwrap().remove("lines");
        let decoded: Order = serde_json::from_value(json).unwrap();
        assert!(decoded.lines.is_empty());
        assert_eq!(decoded.id, order.id);
    }
}
