//! HTTP shell for the pantry cart and order services.
//!
//! Exposes the cart and order operations over REST, with structured logging
//! (tracing) and Prometheus metrics. Identity is taken from request headers
//! set by an upstream authenticator.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use domain::{CartService, OrderService};
use metrics_exporter_prometheus::PrometheusHandle;
use store::PantryStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S> {
    pub carts: CartService<S>,
    pub orders: OrderService<S>,
}

impl<S: PantryStore> AppState<S> {
    /// Wires both services over one store.
    pub fn new(store: S) -> Self {
        Self {
            carts: CartService::new(store.clone()),
            orders: OrderService::new(store),
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: PantryStore>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    use routes::{carts, orders};

    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health))
        .route(
            "/carts/current",
            get(carts::current::<S>).delete(carts::clear::<S>),
        )
        .route("/carts/items", post(carts::add_item::<S>))
        .route(
            "/carts/items/{id}",
            put(carts::update_item::<S>).delete(carts::remove_item::<S>),
        )
        .route("/carts/checkout", post(carts::checkout::<S>))
        .route("/orders", get(orders::list::<S>))
        .route("/orders/{id}", get(orders::get::<S>))
        .route("/orders/{id}/status", put(orders::update_status::<S>))
        .route("/orders/{id}/assign", put(orders::assign::<S>))
        .route("/orders/{id}/cancel", post(orders::cancel::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
