//! Cart service: the mutable line set of a user's in-progress selection.

use common::{CartId, CartItemId, PantryId, UserId};
use store::{Cart, CartItem, CartRepository, ItemRepository, StoreError};

use super::{AddToCart, UpdateLineQuantity, ensure_orderable};
use crate::error::{DomainError, Result};

/// Service for managing carts.
///
/// Every operation is an independent unit of work against the store. Stock
/// checks read the item's quantity at call time and hold nothing.
pub struct CartService<S> {
    store: S,
}

impl<S: ItemRepository + CartRepository> CartService<S> {
    /// Creates a new cart service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the user's active cart, creating one at `pantry_id` if none exists.
    #[tracing::instrument(skip(self))]
    pub async fn get_or_create_active_cart(
        &self,
        user_id: UserId,
        pantry_id: PantryId,
    ) -> Result<Cart> {
        if let Some(cart) = self.store.find_active_cart(user_id).await? {
            return Ok(cart);
        }

        let cart = Cart::new(user_id, pantry_id);
        match self.store.create_cart(&cart).await {
            Ok(()) => {
                metrics::counter!("carts_created_total").increment(1);
                tracing::debug!(cart_id = %cart.id, "created active cart");
                self.load(cart.id).await
            }
            // A concurrent request created the cart first; use theirs
            Err(StoreError::UniqueViolation(_)) => self
                .store
                .find_active_cart(user_id)
                .await?
                .ok_or(DomainError::NoActiveCart),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns the user's active cart without creating one.
    #[tracing::instrument(skip(self))]
    pub async fn current_cart(&self, user_id: UserId) -> Result<Option<Cart>> {
        Ok(self.store.find_active_cart(user_id).await?)
    }

    /// Loads a cart by id with its lines.
    #[tracing::instrument(skip(self))]
    pub async fn get_cart(&self, cart_id: CartId) -> Result<Cart> {
        self.load(cart_id).await
    }

    /// Adds units of an item to the user's active cart.
    ///
    /// Adding an item already in the cart increases that line's quantity; the
    /// stock check is then made against the new cumulative amount.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(&self, user_id: UserId, cmd: AddToCart) -> Result<Cart> {
        if cmd.quantity < 1 {
            return Err(DomainError::InvalidQuantity {
                quantity: cmd.quantity,
            });
        }

        let item = self.store.find_item(cmd.item_id).await?;
        ensure_orderable(cmd.item_id, item.as_ref(), cmd.quantity)?;

        let cart = self
            .get_or_create_active_cart(user_id, cmd.pantry_id)
            .await?;

        let existing = match self.store.find_cart_line(cart.id, cmd.item_id).await? {
            Some(line) => Some(line),
            None => {
                let line = CartItem::new(cart.id, cmd.item_id, cmd.quantity);
                match self.store.add_cart_line(&line).await {
                    Ok(()) => {
                        tracing::debug!(cart_item_id = %line.id, quantity = cmd.quantity, "added cart line");
                        None
                    }
                    // A concurrent add created the line first; add to it instead
                    Err(StoreError::UniqueViolation(constraint)) => {
                        match self.store.find_cart_line(cart.id, cmd.item_id).await? {
                            Some(line) => Some(line),
                            None => return Err(StoreError::UniqueViolation(constraint).into()),
                        }
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };

        if let Some(mut line) = existing {
            let new_quantity = line.quantity.saturating_add(cmd.quantity);
            ensure_orderable(cmd.item_id, item.as_ref(), new_quantity)?;
            line.quantity = new_quantity;
            self.store.update_cart_line(&line).await?;
            tracing::debug!(cart_item_id = %line.id, new_quantity, "increased cart line");
        }

        metrics::counter!("cart_items_added_total").increment(1);
        self.load(cart.id).await
    }

    /// Overwrites the quantity of a line in the user's active cart.
    ///
    /// A quantity of 0 removes the line. Any other quantity is checked against
    /// the item's current stock.
    #[tracing::instrument(skip(self))]
    pub async fn update_line_quantity(
        &self,
        user_id: UserId,
        cmd: UpdateLineQuantity,
    ) -> Result<Cart> {
        if cmd.quantity < 0 {
            return Err(DomainError::InvalidQuantity {
                quantity: cmd.quantity,
            });
        }

        let cart = self.active_cart(user_id).await?;
        let mut line = cart
            .line(cmd.cart_item_id)
            .cloned()
            .ok_or(DomainError::CartItemNotFound(cmd.cart_item_id))?;

        if cmd.quantity == 0 {
            self.store.remove_cart_line(line.id).await?;
            tracing::debug!(cart_item_id = %line.id, "removed cart line");
        } else {
            let item = self
                .store
                .find_item(line.item_id)
                .await?
                .ok_or(DomainError::ItemNotFound {
                    item_id: line.item_id,
                })?;

            if item.quantity < cmd.quantity {
                return Err(DomainError::InsufficientStock {
                    item_id: item.id,
                    name: item.name,
                    requested: cmd.quantity,
                    available: item.quantity,
                });
            }

            line.quantity = cmd.quantity;
            self.store.update_cart_line(&line).await?;
            tracing::debug!(cart_item_id = %line.id, quantity = cmd.quantity, "updated cart line");
        }

        self.load(cart.id).await
    }

    /// Removes a line from the user's active cart.
    #[tracing::instrument(skip(self))]
    pub async fn remove_line(&self, user_id: UserId, cart_item_id: CartItemId) -> Result<Cart> {
        let cart = self.active_cart(user_id).await?;
        if cart.line(cart_item_id).is_none() {
            return Err(DomainError::CartItemNotFound(cart_item_id));
        }

        self.store.remove_cart_line(cart_item_id).await?;
        self.load(cart.id).await
    }

    /// Removes every line from the user's active cart. The cart stays active.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, user_id: UserId) -> Result<()> {
        let cart = self.active_cart(user_id).await?;
        self.store.clear_cart_lines(cart.id).await?;
        Ok(())
    }

    pub(super) async fn active_cart(&self, user_id: UserId) -> Result<Cart> {
        self.store
            .find_active_cart(user_id)
            .await?
            .ok_or(DomainError::NoActiveCart)
    }

    async fn load(&self, cart_id: CartId) -> Result<Cart> {
        self.store
            .find_cart(cart_id)
            .await?
            .ok_or(DomainError::CartNotFound(cart_id))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use common::{CartStatus, ItemId};
    use store::{InMemoryStore, Item};

    use super::*;

    async fn setup(stock: i32) -> (CartService<InMemoryStore>, Item) {
        let store = InMemoryStore::new();
        let item = Item::new(PantryId::new(), "Canned Tuna", stock);
        store.create_item(&item).await.unwrap();
        (CartService::new(store), item)
    }

    fn add(item: &Item, quantity: i32) -> AddToCart {
        AddToCart::new(item.pantry_id, item.id, quantity)
    }

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let (service, _) = setup(1).await;
        let user = UserId::new();
        let pantry = PantryId::new();

        let first = service.get_or_create_active_cart(user, pantry).await.unwrap();
        let second = service
            .get_or_create_active_cart(user, PantryId::new())
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.pantry_id, pantry);
        assert_eq!(second.status, CartStatus::Active);
    }

    #[tokio::test]
    async fn add_item_creates_cart_lazily() {
        let (service, item) = setup(10).await;
        let user = UserId::new();
        assert!(service.current_cart(user).await.unwrap().is_none());

        let cart = service.add_item(user, add(&item, 4)).await.unwrap();

        assert_eq!(cart.user_id, user);
        assert_eq!(cart.pantry_id, item.pantry_id);
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.items[0].quantity, 4);
    }

    #[tokio::test]
    async fn add_zero_quantity_is_invalid() {
        let (service, item) = setup(10).await;
        let result = service.add_item(UserId::new(), add(&item, 0)).await;
        assert!(matches!(
            result,
            Err(DomainError::InvalidQuantity { quantity: 0 })
        ));
    }

    #[tokio::test]
    async fn add_unknown_item_fails_without_creating_cart() {
        let (service, item) = setup(10).await;
        let user = UserId::new();
        let cmd = AddToCart::new(item.pantry_id, ItemId::new(), 1);

        let result = service.add_item(user, cmd).await;

        assert!(matches!(result, Err(DomainError::ItemNotFound { .. })));
        assert!(service.current_cart(user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn repeated_add_accumulates_then_respects_stock() {
        let (service, item) = setup(10).await;
        let user = UserId::new();

        service.add_item(user, add(&item, 3)).await.unwrap();
        let cart = service.add_item(user, add(&item, 5)).await.unwrap();
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.items[0].quantity, 8);

        let result = service.add_item(user, add(&item, 3)).await;
        assert!(matches!(
            result,
            Err(DomainError::InsufficientStock {
                requested: 11,
                available: 10,
                ..
            })
        ));

        let cart = service.current_cart(user).await.unwrap().unwrap();
        assert_eq!(cart.items[0].quantity, 8);
    }

    #[tokio::test]
    async fn update_to_zero_removes_line() {
        let (service, item) = setup(10).await;
        let other = Item::new(item.pantry_id, "Pasta", 10);
        service.store().create_item(&other).await.unwrap();
        let user = UserId::new();

        service.add_item(user, add(&item, 2)).await.unwrap();
        let cart = service.add_item(user, add(&other, 1)).await.unwrap();
        let line_id = cart.line_for_item(item.id).unwrap().id;

        let cart = service
            .update_line_quantity(user, UpdateLineQuantity::new(line_id, 0))
            .await
            .unwrap();

        assert_eq!(cart.line_count(), 1);
        assert!(cart.line(line_id).is_none());
    }

    #[tokio::test]
    async fn update_checks_current_stock() {
        let (service, item) = setup(6).await;
        let user = UserId::new();
        let cart = service.add_item(user, add(&item, 2)).await.unwrap();
        let line_id = cart.items[0].id;

        let result = service
            .update_line_quantity(user, UpdateLineQuantity::new(line_id, 7))
            .await;
        assert!(matches!(result, Err(DomainError::InsufficientStock { .. })));

        let cart = service
            .update_line_quantity(user, UpdateLineQuantity::new(line_id, 6))
            .await
            .unwrap();
        assert_eq!(cart.items[0].quantity, 6);
    }

    #[tokio::test]
    async fn update_without_cart_or_line_fails() {
        let (service, item) = setup(6).await;
        let user = UserId::new();

        let result = service
            .update_line_quantity(user, UpdateLineQuantity::new(CartItemId::new(), 1))
            .await;
        assert!(matches!(result, Err(DomainError::NoActiveCart)));

        service.add_item(user, add(&item, 1)).await.unwrap();
        let missing = CartItemId::new();
        let result = service
            .update_line_quantity(user, UpdateLineQuantity::new(missing, 1))
            .await;
        assert!(matches!(result, Err(DomainError::CartItemNotFound(id)) if id == missing));
    }

    #[tokio::test]
    async fn cannot_touch_another_users_line() {
        let (service, item) = setup(6).await;
        let owner = UserId::new();
        let intruder = UserId::new();
        let cart = service.add_item(owner, add(&item, 1)).await.unwrap();
        service.add_item(intruder, add(&item, 1)).await.unwrap();

        let result = service.remove_line(intruder, cart.items[0].id).await;
        assert!(matches!(result, Err(DomainError::CartItemNotFound(_))));
    }

    #[tokio::test]
    async fn remove_line_and_clear() {
        let (service, item) = setup(6).await;
        let user = UserId::new();
        let cart = service.add_item(user, add(&item, 1)).await.unwrap();

        let cart = service.remove_line(user, cart.items[0].id).await.unwrap();
        assert!(cart.is_empty());

        service.add_item(user, add(&item, 2)).await.unwrap();
        service.clear(user).await.unwrap();
        let cart = service.current_cart(user).await.unwrap().unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.status, CartStatus::Active);
    }

    #[tokio::test]
    async fn clear_without_cart_fails() {
        let (service, _) = setup(1).await;
        let result = service.clear(UserId::new()).await;
        assert!(matches!(result, Err(DomainError::NoActiveCart)));
    }

    /// Delegates to an in-memory store, but the next line lookup misses once
    /// `stale` is set, as if another request inserted the line concurrently.
    struct StaleLineLookup {
        inner: InMemoryStore,
        stale: AtomicBool,
    }

    #[async_trait]
    impl ItemRepository for StaleLineLookup {
        async fn create_item(&self, item: &Item) -> store::Result<()> {
            self.inner.create_item(item).await
        }

        async fn find_item(&self, id: ItemId) -> store::Result<Option<Item>> {
            self.inner.find_item(id).await
        }

        async fn update_item(&self, item: &Item) -> store::Result<()> {
            self.inner.update_item(item).await
        }

        async fn delete_item(&self, id: ItemId) -> store::Result<()> {
            self.inner.delete_item(id).await
        }
    }

    #[async_trait]
    impl CartRepository for StaleLineLookup {
        async fn create_cart(&self, cart: &Cart) -> store::Result<()> {
            self.inner.create_cart(cart).await
        }

        async fn find_cart(&self, id: CartId) -> store::Result<Option<Cart>> {
            self.inner.find_cart(id).await
        }

        async fn find_active_cart(&self, user_id: UserId) -> store::Result<Option<Cart>> {
            self.inner.find_active_cart(user_id).await
        }

        async fn update_cart(&self, cart: &Cart) -> store::Result<()> {
            self.inner.update_cart(cart).await
        }

        async fn find_cart_line(
            &self,
            cart_id: CartId,
            item_id: ItemId,
        ) -> store::Result<Option<CartItem>> {
            if self.stale.swap(false, Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.find_cart_line(cart_id, item_id).await
        }

        async fn add_cart_line(&self, line: &CartItem) -> store::Result<()> {
            self.inner.add_cart_line(line).await
        }

        async fn update_cart_line(&self, line: &CartItem) -> store::Result<()> {
            self.inner.update_cart_line(line).await
        }

        async fn remove_cart_line(&self, id: CartItemId) -> store::Result<()> {
            self.inner.remove_cart_line(id).await
        }

        async fn clear_cart_lines(&self, cart_id: CartId) -> store::Result<()> {
            self.inner.clear_cart_lines(cart_id).await
        }
    }

    #[tokio::test]
    async fn add_item_merges_into_concurrently_created_line() {
        let inner = InMemoryStore::new();
        let item = Item::new(PantryId::new(), "Chickpeas", 10);
        inner.create_item(&item).await.unwrap();
        let service = CartService::new(StaleLineLookup {
            inner,
            stale: AtomicBool::new(false),
        });
        let user = UserId::new();

        service.add_item(user, add(&item, 2)).await.unwrap();
        service.store().stale.store(true, Ordering::SeqCst);
        let cart = service.add_item(user, add(&item, 3)).await.unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.items[0].quantity, 5);
    }

    #[tokio::test]
    async fn merged_line_is_still_stock_checked() {
        let inner = InMemoryStore::new();
        let item = Item::new(PantryId::new(), "Chickpeas", 4);
        inner.create_item(&item).await.unwrap();
        let service = CartService::new(StaleLineLookup {
            inner,
            stale: AtomicBool::new(false),
        });
        let user = UserId::new();

        service.add_item(user, add(&item, 2)).await.unwrap();
        service.store().stale.store(true, Ordering::SeqCst);
        let result = service.add_item(user, add(&item, 3)).await;

        assert!(matches!(
            result,
            Err(DomainError::InsufficientStock { requested: 5, .. })
        ));
    }
}
