//! Shared types for the pantry ordering system.
//!
//! Identifiers are UUID newtypes so a cart id can never be passed where an
//! item id is expected. Status enums are shared by the storage and domain
//! layers because both need the same string codec.

pub mod status;
pub mod types;

pub use status::{CartStatus, OrderStatus, ParseStatusError};
pub use types::{CartId, CartItemId, ItemId, OrderId, PantryId, StaffId, UserId};
