use serde::{Deserialize, Serialize};
use store::Order;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// A requested page of orders, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    /// Creates a page request, normalising out-of-range values.
    ///
    /// A page below 1 becomes 1. A page size outside `1..=100` becomes 20.
    pub fn new(page: i64, page_size: i64) -> Self {
        let page = page.max(1);
        let page_size = if (1..=MAX_PAGE_SIZE).contains(&page_size) {
            page_size
        } else {
            DEFAULT_PAGE_SIZE
        };
        Self { page, page_size }
    }

    /// Number of orders to skip.
    pub fn offset(&self) -> usize {
        usize::try_from((self.page - 1).saturating_mul(self.page_size)).unwrap_or(usize::MAX)
    }

    /// Maximum number of orders on the page.
    pub fn limit(&self) -> usize {
        usize::try_from(self.page_size).unwrap_or(DEFAULT_PAGE_SIZE as usize)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// One page of an order listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub total: u64,
    pub page: i64,
    pub pages: u64,
}

impl OrderPage {
    pub(crate) fn new(orders: Vec<Order>, total: u64, request: PageRequest) -> Self {
        let page_size = request.page_size.unsigned_abs();
        Self {
            orders,
            total,
            page: request.page,
            pages: total.div_ceil(page_size),
        }
    }
}
