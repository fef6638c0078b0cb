//! Business logic services for the stock reconciliation service

pub mod stock;

pub use stock::{StockCsvRow, StockService};
