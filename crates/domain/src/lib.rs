//! Domain layer for the pantry ordering core.
//!
//! This crate provides:
//! - `CartService`: the per-user cart and the checkout transition
//! - `OrderService`: order lookup, listing and the status machine
//! - `auth`: the ownership/role guard shared by every order operation

pub mod auth;
pub mod cart;
pub mod error;
pub mod order;

pub use auth::{Actor, Role, authorize, can_access};
pub use cart::{AddToCart, CartService, UpdateLineQuantity};
pub use error::{DomainError, ErrorKind, Result};
pub use order::{OrderPage, OrderService, PageRequest};
