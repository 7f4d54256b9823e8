//! Order lifecycle: the status machine, pagination and the order service.

mod page;
mod service;
pub mod state;

pub use page::{OrderPage, PageRequest};
pub use service::OrderService;
pub use state::{allowed_transitions, can_transition, is_cancellable};
