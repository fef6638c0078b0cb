//! Route definitions for the stock reconciliation service

use axum::{middleware, routing::get, Router};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - product stock
        .nest("/products", product_routes(state))
}

/// Product stock routes (protected, admin roles only)
fn product_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/all", get(handlers::list_products_with_stock))
        .route("/low-stock", get(handlers::get_low_stock))
        .route("/over-exported", get(handlers::get_over_exported))
        .route("/stock/:product_id", get(handlers::get_variant_stock))
        .route("/:product_id/stock", get(handlers::get_stock_totals))
        .route("/:product_id/colors", get(handlers::get_product_colors))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
