//! Checkout: the one-way conversion of an active cart into a pending order.

use common::{CartStatus, UserId};
use store::{CartRepository, ItemRepository, Order};

use super::{CartService, ensure_orderable};
use crate::error::{DomainError, Result};

impl<S: ItemRepository + CartRepository> CartService<S> {
    /// Converts the user's active cart into a pending order.
    ///
    /// Every line is re-validated against current inventory. On success the
    /// cart is marked `submitted` and saved; the returned order is NOT
    /// persisted (see `OrderService::place_order`).
    ///
    /// Item quantities are not decremented here.
    #[tracing::instrument(skip(self, notes))]
    pub async fn checkout(&self, user_id: UserId, notes: impl Into<String>) -> Result<Order> {
        let mut cart = self.active_cart(user_id).await?;

        if cart.is_empty() {
            return Err(DomainError::EmptyCart);
        }

        for line in &cart.items {
            let item = self.store().find_item(line.item_id).await?;
            ensure_orderable(line.item_id, item.as_ref(), line.quantity)?;
        }

        let order = Order::new(cart.id, user_id, cart.pantry_id, notes);

        cart.status = CartStatus::Submitted;
        self.store().update_cart(&cart).await?;

        metrics::counter!("checkouts_total").increment(1);
        tracing::info!(
            cart_id = %cart.id,
            order_id = %order.id,
            lines = cart.line_count(),
            units = cart.total_quantity(),
            "cart checked out"
        );

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use common::PantryId;
    use store::{InMemoryStore, Item};

    use super::*;
    use crate::cart::AddToCart;

    async fn cart_with(stock: i32, quantity: i32) -> (CartService<InMemoryStore>, Item, UserId) {
        let store = InMemoryStore::new();
        let item = Item::new(PantryId::new(), "Cereal", stock);
        store.create_item(&item).await.unwrap();
        let service = CartService::new(store);
        let user = UserId::new();
        service
            .add_item(user, AddToCart::new(item.pantry_id, item.id, quantity))
            .await
            .unwrap();
        (service, item, user)
    }

    #[tokio::test]
    async fn checkout_without_cart_fails() {
        let service = CartService::new(InMemoryStore::new());
        let result = service.checkout(UserId::new(), "").await;
        assert!(matches!(result, Err(DomainError::NoActiveCart)));
    }

    #[tokio::test]
    async fn checkout_empty_cart_fails() {
        let service = CartService::new(InMemoryStore::new());
        let user = UserId::new();
        service
            .get_or_create_active_cart(user, PantryId::new())
            .await
            .unwrap();

        let result = service.checkout(user, "").await;
        assert!(matches!(result, Err(DomainError::EmptyCart)));
    }

    #[tokio::test]
    async fn checkout_produces_pending_order_and_submits_cart() {
        let (service, item, user) = cart_with(10, 4).await;
        let cart = service.current_cart(user).await.unwrap().unwrap();

        let order = service.checkout(user, "leave at door").await.unwrap();

        assert_eq!(order.status, common::OrderStatus::Pending);
        assert_eq!(order.notes, "leave at door");
        assert_eq!(order.cart_id, cart.id);
        assert_eq!(order.pantry_id, item.pantry_id);
        assert_eq!(order.user_id, user);

        let cart = service.get_cart(cart.id).await.unwrap();
        assert_eq!(cart.status, CartStatus::Submitted);
        assert!(service.current_cart(user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn checkout_does_not_touch_stock() {
        let (service, item, user) = cart_with(10, 4).await;
        service.checkout(user, "").await.unwrap();

        let stored = service.store().find_item(item.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 10);
    }

    #[tokio::test]
    async fn second_checkout_has_no_active_cart() {
        let (service, _, user) = cart_with(10, 4).await;
        service.checkout(user, "").await.unwrap();

        let result = service.checkout(user, "").await;
        assert!(matches!(result, Err(DomainError::NoActiveCart)));
    }

    #[tokio::test]
    async fn checkout_revalidates_stock() {
        let (service, mut item, user) = cart_with(10, 4).await;
        item.quantity = 3;
        service.store().update_item(&item).await.unwrap();

        let result = service.checkout(user, "").await;
        assert!(matches!(
            result,
            Err(DomainError::InsufficientStock { ref name, .. }) if name == "Cereal"
        ));

        // Failed checkout leaves the cart active
        assert!(service.current_cart(user).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn checkout_rejects_disabled_or_deleted_items() {
        let (service, item, user) = cart_with(10, 1).await;
        let disabled = item.clone().unavailable();
        service.store().update_item(&disabled).await.unwrap();
        let result = service.checkout(user, "").await;
        assert!(matches!(result, Err(DomainError::ItemUnavailable { .. })));

        service.store().delete_item(item.id).await.unwrap();
        let result = service.checkout(user, "").await;
        assert!(matches!(result, Err(DomainError::ItemNotFound { item_id }) if item_id == item.id));
    }
}
