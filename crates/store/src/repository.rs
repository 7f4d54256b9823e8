use async_trait::async_trait;
use common::{CartId, CartItemId, ItemId, OrderId, UserId};

use crate::{Cart, CartItem, Item, Order, OrderQuery, Result};

/// Read/write access to inventory items.
///
/// Quantity updates are plain overwrites: callers read, modify and save.
/// There is no compare-and-set.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Inserts a new item.
    async fn create_item(&self, item: &Item) -> Result<()>;

    /// Fetches an item. Returns None if it does not exist.
    async fn find_item(&self, id: ItemId) -> Result<Option<Item>>;

    /// Persists the item's mutable fields (quantity, availability, threshold).
    ///
    /// Fails with `NotFound` if the item has been deleted.
    async fn update_item(&self, item: &Item) -> Result<()>;

    /// Deletes an item. Deleting a missing item is not an error.
    async fn delete_item(&self, id: ItemId) -> Result<()>;
}

/// Persistence for carts and their lines.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Inserts a new cart.
    ///
    /// Fails with `UniqueViolation` if the user already has an active cart.
    async fn create_cart(&self, cart: &Cart) -> Result<()>;

    /// Fetches a cart with all of its lines.
    async fn find_cart(&self, id: CartId) -> Result<Option<Cart>>;

    /// Fetches the user's active cart with all of its lines.
    async fn find_active_cart(&self, user_id: UserId) -> Result<Option<Cart>>;

    /// Persists the cart's status. Lines are not touched.
    async fn update_cart(&self, cart: &Cart) -> Result<()>;

    /// Fetches the line holding `item_id` in a cart.
    async fn find_cart_line(&self, cart_id: CartId, item_id: ItemId) -> Result<Option<CartItem>>;

    /// Inserts a new line.
    ///
    /// Fails with `UniqueViolation` if the cart already holds the item.
    async fn add_cart_line(&self, line: &CartItem) -> Result<()>;

    /// Persists a line's quantity.
    async fn update_cart_line(&self, line: &CartItem) -> Result<()>;

    /// Deletes a line.
    async fn remove_cart_line(&self, id: CartItemId) -> Result<()>;

    /// Deletes every line of a cart.
    async fn clear_cart_lines(&self, cart_id: CartId) -> Result<()>;
}

/// Persistence for orders.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Inserts a new order.
    async fn create_order(&self, order: &Order) -> Result<()>;

    /// Fetches an order together with the lines of its originating cart.
    async fn find_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Persists status, assignment, notes and milestone timestamps.
    async fn update_order(&self, order: &Order) -> Result<()>;

    /// Lists matching orders, newest first, each with its cart lines.
    async fn list_orders(&self, query: &OrderQuery) -> Result<Vec<Order>>;

    /// Counts matching orders, ignoring limit and offset.
    async fn count_orders(&self, query: &OrderQuery) -> Result<u64>;
}

/// Everything the HTTP shell needs from a single backing store.
pub trait PantryStore:
    ItemRepository + CartRepository + OrderRepository + Clone + 'static
{
}

impl<T> PantryStore for T where
    T: ItemRepository + CartRepository + OrderRepository + Clone + 'static
{
}
