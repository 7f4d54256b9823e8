//! Persistence for the pantry ordering core.
//!
//! The core only talks to the three repository traits defined here. Two
//! implementations are provided: [`InMemoryStore`] for tests and local runs,
//! and [`PostgresStore`] backed by sqlx.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod query;
pub mod repository;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use model::{Cart, CartItem, Item, Order};
pub use postgres::PostgresStore;
pub use query::OrderQuery;
pub use repository::{CartRepository, ItemRepository, OrderRepository, PantryStore};
