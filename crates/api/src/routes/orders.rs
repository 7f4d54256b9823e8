//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::{OrderId, OrderStatus, StaffId};
use domain::{OrderPage, PageRequest};
use serde::Deserialize;
use store::{Order, PantryStore};

use super::identity::Identity;
use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<OrderStatus>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub staff_id: StaffId,
}

/// GET /orders
#[tracing::instrument(skip(state))]
pub async fn list<S: PantryStore>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Query(params): Query<ListParams>,
) -> Result<Json<OrderPage>, ApiError> {
    let page = PageRequest::new(params.page.unwrap_or(1), params.page_size.unwrap_or(0));
    let page = state.orders.list_orders(&actor, params.status, page).await?;
    Ok(Json(page))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: PantryStore>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>, ApiError> {
    let order = state.orders.get_order(id, &actor).await?;
    Ok(Json(order))
}

/// PUT /orders/{id}/status (admin only)
#[tracing::instrument(skip(state))]
pub async fn update_status<S: PantryStore>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(id): Path<OrderId>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Order>, ApiError> {
    identity.require_admin()?;
    let order = state.orders.update_status(id, req.status).await?;
    Ok(Json(order))
}

/// PUT /orders/{id}/assign (admin only)
#[tracing::instrument(skip(state))]
pub async fn assign<S: PantryStore>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(id): Path<OrderId>,
    Json(req): Json<AssignRequest>,
) -> Result<Json<Order>, ApiError> {
    identity.require_admin()?;
    let order = state.orders.assign_staff(id, req.staff_id).await?;
    Ok(Json(order))
}

/// POST /orders/{id}/cancel
#[tracing::instrument(skip(state))]
pub async fn cancel<S: PantryStore>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>, ApiError> {
    let order = state.orders.cancel(id, &actor).await?;
    Ok(Json(order))
}
