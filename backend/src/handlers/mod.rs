//! HTTP handlers for the stock reconciliation service

pub mod health;
pub mod stock;

pub use health::health_check;
pub use stock::{
    get_low_stock, get_over_exported, get_product_colors, get_stock_totals, get_variant_stock,
    list_products_with_stock,
};
