//! Cart endpoints. Every route acts on the caller's own active cart.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::CartItemId;
use domain::{AddToCart, DomainError, UpdateLineQuantity};
use serde::Deserialize;
use store::{Cart, Order, PantryStore};

use super::identity::Identity;
use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub quantity: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub notes: String,
}

/// GET /carts/current
#[tracing::instrument(skip(state))]
pub async fn current<S: PantryStore>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
) -> Result<Json<Cart>, ApiError> {
    let cart = state
        .carts
        .current_cart(actor.user_id)
        .await?
        .ok_or(DomainError::NoActiveCart)?;
    Ok(Json(cart))
}

/// POST /carts/items
#[tracing::instrument(skip(state))]
pub async fn add_item<S: PantryStore>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Json(cmd): Json<AddToCart>,
) -> Result<Json<Cart>, ApiError> {
    let cart = state.carts.add_item(actor.user_id, cmd).await?;
    Ok(Json(cart))
}

/// PUT /carts/items/{id}
#[tracing::instrument(skip(state))]
pub async fn update_item<S: PantryStore>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Path(id): Path<CartItemId>,
    Json(req): Json<QuantityRequest>,
) -> Result<Json<Cart>, ApiError> {
    let cart = state
        .carts
        .update_line_quantity(actor.user_id, UpdateLineQuantity::new(id, req.quantity))
        .await?;
    Ok(Json(cart))
}

/// DELETE /carts/items/{id}
#[tracing::instrument(skip(state))]
pub async fn remove_item<S: PantryStore>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Path(id): Path<CartItemId>,
) -> Result<Json<Cart>, ApiError> {
    let cart = state.carts.remove_line(actor.user_id, id).await?;
    Ok(Json(cart))
}

/// DELETE /carts/current
#[tracing::instrument(skip(state))]
pub async fn clear<S: PantryStore>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
) -> Result<StatusCode, ApiError> {
    state.carts.clear(actor.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /carts/checkout: submits the cart and places the resulting order.
#[tracing::instrument(skip(state, req))]
pub async fn checkout<S: PantryStore>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = state.carts.checkout(actor.user_id, req.notes).await?;
    let order = state.orders.place_order(order).await?;
    Ok((StatusCode::CREATED, Json(order)))
}
