use common::{OrderStatus, UserId};

use crate::Order;

/// Builder for order listing and counting queries.
///
/// Every filter is optional; an empty query matches all orders. `limit` and
/// `offset` are ignored when counting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQuery {
    /// Restrict to orders placed by this user.
    pub user_id: Option<UserId>,

    /// Restrict to orders in this status.
    pub status: Option<OrderStatus>,

    /// Maximum number of orders to return.
    pub limit: Option<usize>,

    /// Number of orders to skip.
    pub offset: Option<usize>,
}

impl OrderQuery {
    /// Creates a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for the orders of one user.
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    /// Filters by status, when one is given.
    pub fn status(mut self, status: Option<OrderStatus>) -> Self {
        self.status = status;
        self
    }

    /// Limits the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips the first `offset` results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns true if the order passes every filter.
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(user_id) = self.user_id
            && order.user_id != user_id
        {
            return false;
        }
        if let Some(status) = self.status
            && order.status != status
        {
            return false;
        }
        true
    }
}
