//! Order service: persistence, lookup and the lifecycle operations.

use chrono::Utc;
use common::{OrderId, OrderStatus, StaffId};
use store::{ItemRepository, Order, OrderQuery, OrderRepository, StoreError};

use super::state::{is_cancellable, transition};
use super::{OrderPage, PageRequest};
use crate::auth::{Actor, authorize};
use crate::error::{DomainError, Result};

/// Service for managing orders.
///
/// Status and assignment updates are last-writer-wins: each call validates
/// against the status it just read and overwrites the row.
pub struct OrderService<S> {
    store: S,
}

impl<S: ItemRepository + OrderRepository> OrderService<S> {
    /// Creates a new order service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Persists an order produced by checkout and reloads it with its lines.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn place_order(&self, order: Order) -> Result<Order> {
        self.store.create_order(&order).await?;
        tracing::info!(user_id = %order.user_id, "order placed");
        self.load(order.id).await
    }

    /// Fetches an order the actor is allowed to view.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId, actor: &Actor) -> Result<Order> {
        let order = self.load(order_id).await?;
        authorize(actor, order.user_id, "view")?;
        Ok(order)
    }

    /// Lists orders visible to the actor, newest first.
    ///
    /// Admins see every order; everyone else sees only their own. The status
    /// filter applies to both, so a shopper can narrow their own history.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(
        &self,
        actor: &Actor,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<OrderPage> {
        let query = if actor.is_admin() {
            OrderQuery::new()
        } else {
            OrderQuery::for_user(actor.user_id)
        }
        .status(status);

        let total = self.store.count_orders(&query).await?;
        let orders = self
            .store
            .list_orders(&query.limit(page.limit()).offset(page.offset()))
            .await?;

        Ok(OrderPage::new(orders, total, page))
    }

    /// Moves an order to a new status along the transition table.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, order_id: OrderId, status: OrderStatus) -> Result<Order> {
        let mut order = self.load(order_id).await?;
        let from = order.status;

        transition(&mut order, status, Utc::now())?;
        self.store.update_order(&order).await?;

        metrics::counter!("order_status_transitions_total", "to" => status.as_str()).increment(1);
        tracing::info!(%from, to = %status, "order status updated");

        Ok(order)
    }

    /// Assigns a staff member to an order, replacing any prior assignment.
    #[tracing::instrument(skip(self))]
    pub async fn assign_staff(&self, order_id: OrderId, staff_id: StaffId) -> Result<Order> {
        let mut order = self.load(order_id).await?;

        if order.status.is_terminal() {
            return Err(DomainError::CannotAssign {
                status: order.status,
            });
        }

        order.assigned_to = Some(staff_id);
        order.updated_at = Utc::now();
        self.store.update_order(&order).await?;

        Ok(order)
    }

    /// Cancels a pending or preparing order and puts its units back in stock.
    ///
    /// A line whose item has been deleted is logged and skipped, so a
    /// cancellation is never blocked by missing inventory. Any other store
    /// failure aborts before the status changes; lines restored up to that
    /// point stay restored.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, order_id: OrderId, actor: &Actor) -> Result<Order> {
        let mut order = self.load(order_id).await?;
        authorize(actor, order.user_id, "cancel")?;

        if !is_cancellable(order.status) {
            return Err(DomainError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Cancelled,
            });
        }

        let mut restored: u64 = 0;
        for line in &order.lines {
            let Some(mut item) = self.store.find_item(line.item_id).await? else {
                tracing::warn!(item_id = %line.item_id, "item gone, skipping restore");
                continue;
            };

            item.quantity = item.quantity.saturating_add(line.quantity);
            item.updated_at = Utc::now();
            match self.store.update_item(&item).await {
                Ok(()) => restored += u64::from(line.quantity.unsigned_abs()),
                // Deleted between read and write
                Err(StoreError::NotFound { .. }) => {
                    tracing::warn!(item_id = %item.id, "item gone, skipping restore");
                }
                Err(e) => return Err(e.into()),
            }
        }

        transition(&mut order, OrderStatus::Cancelled, Utc::now())?;
        self.store.update_order(&order).await?;

        metrics::counter!("orders_cancelled_total").increment(1);
        metrics::counter!("inventory_restored_units_total").increment(restored);
        tracing::info!(restored, "order cancelled");

        Ok(order)
    }

    async fn load(&self, order_id: OrderId) -> Result<Order> {
        self.store
            .find_order(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound(order_id))
    }
}
