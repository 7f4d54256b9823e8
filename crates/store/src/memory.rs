use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{CartId, CartItemId, ItemId, OrderId, UserId};
use tokio::sync::RwLock;

use crate::{
    Cart, CartItem, CartRepository, Item, ItemRepository, Order, OrderQuery, OrderRepository,
    Result, StoreError,
};

#[derive(Default)]
struct State {
    items: HashMap<ItemId, Item>,
    /// Carts are stored without lines; lines live in `lines`.
    carts: HashMap<CartId, Cart>,
    /// All cart lines in insertion order.
    lines: Vec<CartItem>,
    /// All orders in insertion order.
    orders: Vec<Order>,
}

impl State {
    fn lines_of(&self, cart_id: CartId) -> Vec<CartItem> {
        self.lines
            .iter()
            .filter(|line| line.cart_id == cart_id)
            .cloned()
            .collect()
    }

    fn cart_with_lines(&self, cart: &Cart) -> Cart {
        let mut cart = cart.clone();
        cart.items = self.lines_of(cart.id);
        cart
    }

    fn order_with_lines(&self, order: &Order) -> Order {
        let mut order = order.clone();
        order.lines = self.lines_of(order.cart_id);
        order
    }
}

/// In-memory store implementation for testing.
///
/// Implements all three repositories over one shared state and enforces the
/// same uniqueness rules as the PostgreSQL schema.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }
}

#[async_trait]
impl ItemRepository for InMemoryStore {
    async fn create_item(&self, item: &Item) -> Result<()> {
        let mut state = self.state.write().await;
        if state.items.contains_key(&item.id) {
            return Err(StoreError::UniqueViolation("items_pkey"));
        }
        state.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn find_item(&self, id: ItemId) -> Result<Option<Item>> {
        Ok(self.state.read().await.items.get(&id).cloned())
    }

    async fn update_item(&self, item: &Item) -> Result<()> {
        let mut state = self.state.write().await;
        let stored = state
            .items
            .get_mut(&item.id)
            .ok_or_else(|| StoreError::not_found("Item", item.id))?;
        *stored = item.clone();
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_item(&self, id: ItemId) -> Result<()> {
        self.state.write().await.items.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl CartRepository for InMemoryStore {
    async fn create_cart(&self, cart: &Cart) -> Result<()> {
        let mut state = self.state.write().await;

        // Mirrors the partial unique index on carts(user_id) WHERE status = 'active'
        if cart.status.is_active()
            && state
                .carts
                .values()
                .any(|c| c.user_id == cart.user_id && c.status.is_active())
        {
            return Err(StoreError::UniqueViolation("carts_one_active_per_user"));
        }

        let mut stored = cart.clone();
        stored.items.clear();
        state.carts.insert(stored.id, stored);
        Ok(())
    }

    async fn find_cart(&self, id: CartId) -> Result<Option<Cart>> {
        let state = self.state.read().await;
        Ok(state.carts.get(&id).map(|cart| state.cart_with_lines(cart)))
    }

    async fn find_active_cart(&self, user_id: UserId) -> Result<Option<Cart>> {
        let state = self.state.read().await;
        Ok(state
            .carts
            .values()
            .find(|cart| cart.user_id == user_id && cart.status.is_active())
            .map(|cart| state.cart_with_lines(cart)))
    }

    async fn update_cart(&self, cart: &Cart) -> Result<()> {
        let mut state = self.state.write().await;
        let stored = state
            .carts
            .get_mut(&cart.id)
            .ok_or_else(|| StoreError::not_found("Cart", cart.id))?;
        stored.status = cart.status;
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn find_cart_line(&self, cart_id: CartId, item_id: ItemId) -> Result<Option<CartItem>> {
        let state = self.state.read().await;
        Ok(state
            .lines
            .iter()
            .find(|line| line.cart_id == cart_id && line.item_id == item_id)
            .cloned())
    }

    async fn add_cart_line(&self, line: &CartItem) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.carts.contains_key(&line.cart_id) {
            return Err(StoreError::not_found("Cart", line.cart_id));
        }
        if state
            .lines
            .iter()
            .any(|l| l.cart_id == line.cart_id && l.item_id == line.item_id)
        {
            return Err(StoreError::UniqueViolation("cart_items_unique_item"));
        }
        state.lines.push(line.clone());
        Ok(())
    }

    async fn update_cart_line(&self, line: &CartItem) -> Result<()> {
        let mut state = self.state.write().await;
        let stored = state
            .lines
            .iter_mut()
            .find(|l| l.id == line.id)
            .ok_or_else(|| StoreError::not_found("CartItem", line.id))?;
        stored.quantity = line.quantity;
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn remove_cart_line(&self, id: CartItemId) -> Result<()> {
        self.state.write().await.lines.retain(|line| line.id != id);
        Ok(())
    }

    async fn clear_cart_lines(&self, cart_id: CartId) -> Result<()> {
        self.state
            .write()
            .await
            .lines
            .retain(|line| line.cart_id != cart_id);
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn create_order(&self, order: &Order) -> Result<()> {
        let mut state = self.state.write().await;
        if state.orders.iter().any(|o| o.id == order.id) {
            return Err(StoreError::UniqueViolation("orders_pkey"));
        }
        let mut stored = order.clone();
        stored.lines.clear();
        state.orders.push(stored);
        Ok(())
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .find(|order| order.id == id)
            .map(|order| state.order_with_lines(order)))
    }

    async fn update_order(&self, order: &Order) -> Result<()> {
        let mut state = self.state.write().await;
        let stored = state
            .orders
            .iter_mut()
            .find(|o| o.id == order.id)
            .ok_or_else(|| StoreError::not_found("Order", order.id))?;
        stored.status = order.status;
        stored.notes = order.notes.clone();
        stored.assigned_to = order.assigned_to;
        stored.ready_at = order.ready_at;
        stored.picked_up_at = order.picked_up_at;
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn list_orders(&self, query: &OrderQuery) -> Result<Vec<Order>> {
        let state = self.state.read().await;

        // Newest first: insertion order reversed
        let matching = state
            .orders
            .iter()
            .rev()
            .filter(|order| query.matches(order))
            .skip(query.offset.unwrap_or(0));

        let orders = match query.limit {
            Some(limit) => matching
                .take(limit)
                .map(|o| state.order_with_lines(o))
                .collect(),
            None => matching.map(|o| state.order_with_lines(o)).collect(),
        };

        Ok(orders)
    }

    async fn count_orders(&self, query: &OrderQuery) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state.orders.iter().filter(|o| query.matches(o)).count() as u64)
    }
}
