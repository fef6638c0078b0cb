//! Data access for movement lines and products
//!
//! The stock service only ever asks two kinds of questions: "which lines of
//! kind K match this product and these document statuses" and "what is the
//! summed quantity of those lines". Everything else is derived in memory.

use async_trait::async_trait;
use shared::models::{
    DocumentStatus, MovementKind, MovementLine, ProductColor, ProductFilter, ProductSummary,
};
use thiserror::Error;

mod memory;
mod postgres;

pub use memory::InMemoryMovementStore;
pub use postgres::PgMovementStore;

/// Errors raised by a movement store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{kind} document {id} not found")]
    DocumentNotFound { kind: MovementKind, id: i64 },

    #[error("Invalid movement line: {0}")]
    InvalidLine(&'static str),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read access to movement lines and the product catalog
#[async_trait]
pub trait MovementStore: Send + Sync {
    /// Lines of `kind` for one product whose parent document status is in `statuses`
    async fn list_lines(
        &self,
        kind: MovementKind,
        product_id: i64,
        statuses: &[DocumentStatus],
    ) -> StoreResult<Vec<MovementLine>>;

    /// Lines of `kind` for several products in a single read
    async fn list_lines_for_products(
        &self,
        kind: MovementKind,
        product_ids: &[i64],
        statuses: &[DocumentStatus],
    ) -> StoreResult<Vec<MovementLine>>;

    /// Summed quantity of the matching lines; `None` when no line matches
    async fn sum_quantity(
        &self,
        kind: MovementKind,
        product_id: i64,
        statuses: &[DocumentStatus],
    ) -> StoreResult<Option<i64>>;

    /// Products matching the filter, newest first
    async fn list_products(&self, filter: &ProductFilter) -> StoreResult<Vec<ProductSummary>>;

    async fn find_product(&self, product_id: i64) -> StoreResult<Option<ProductSummary>>;

    async fn list_product_colors(&self, product_id: i64) -> StoreResult<Vec<ProductColor>>;

    /// Connectivity check used by the health endpoint
    async fn ping(&self) -> StoreResult<()>;
}
