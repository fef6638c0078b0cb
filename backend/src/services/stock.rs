//! Stock reconciliation service
//!
//! Reads movement lines through a `MovementStore` and hands them to the pure
//! functions in `shared::stock`. Nothing is cached and nothing is locked:
//! every call re-reads the current lines, and the reads of one call are not
//! taken from a single snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use shared::models::{
    LowStockProduct, MovementKind, MovementLine, OverExportedProduct, ProductColor,
    ProductFilter, ProductSummary, ProductWithStock, StockTotalsOutcome, VariantStock,
    VariantStockReport,
};
use shared::stock::{self, counted_statuses, CountScope};

use crate::error::{AppError, AppResult};
use crate::store::{MovementStore, StoreResult};

/// Stock service computing derived stock positions
#[derive(Clone)]
pub struct StockService {
    store: Arc<dyn MovementStore>,
}

/// One CSV row per reported variant
#[derive(Debug, Serialize)]
pub struct StockCsvRow {
    pub product_id: i64,
    pub sku: String,
    pub title: String,
    pub color_title: String,
    pub size: String,
    pub imported_quantity: i64,
    pub exported_and_transferred_quantity: i64,
    pub remaining_quantity: i64,
}

impl StockCsvRow {
    pub fn from_variants(product: &ProductSummary, variants: &[VariantStock]) -> Vec<Self> {
        variants
            .iter()
            .map(|v| StockCsvRow {
                product_id: product.id,
                sku: product.sku.clone().unwrap_or_default(),
                title: product.title.clone(),
                color_title: v.color_title.clone(),
                size: v.size.clone(),
                imported_quantity: v.imported_quantity,
                exported_and_transferred_quantity: v.exported_and_transferred_quantity,
                remaining_quantity: v.remaining_quantity,
            })
            .collect()
    }
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(store: Arc<dyn MovementStore>) -> Self {
        Self { store }
    }

    async fn counted_lines(
        &self,
        kind: MovementKind,
        product_id: i64,
    ) -> StoreResult<Vec<MovementLine>> {
        let statuses = counted_statuses(kind, CountScope::ByVariant);
        self.store.list_lines(kind, product_id, statuses).await
    }

    async fn counted_sum(&self, kind: MovementKind, product_id: i64) -> StoreResult<Option<i64>> {
        let statuses = counted_statuses(kind, CountScope::Totals);
        self.store.sum_quantity(kind, product_id, statuses).await
    }

    /// Per-variant stock of a single product
    pub async fn variant_stock(&self, product_id: i64) -> AppResult<VariantStockReport> {
        let (imports, exports, transfers) = tokio::try_join!(
            self.counted_lines(MovementKind::Import, product_id),
            self.counted_lines(MovementKind::Export, product_id),
            self.counted_lines(MovementKind::Transfer, product_id),
        )?;

        let report = stock::reconcile(&imports, &exports, &transfers);
        tracing::debug!(
            product_id,
            variants = report.variants.len(),
            total_quantity = report.total_quantity,
            "Reconciled variant stock"
        );

        Ok(report)
    }

    /// Whole-product totals from raw sums
    pub async fn stock_totals(&self, product_id: i64) -> AppResult<StockTotalsOutcome> {
        let (imported, exported, transferred) = tokio::try_join!(
            self.counted_sum(MovementKind::Import, product_id),
            self.counted_sum(MovementKind::Export, product_id),
            self.counted_sum(MovementKind::Transfer, product_id),
        )?;

        let outcome = stock::summarize_totals(imported, exported, transferred);
        if !outcome.has_activity() {
            tracing::debug!(product_id, "No stock movements recorded");
        }

        Ok(outcome)
    }

    /// Per-variant stock for many products from one read per movement kind.
    ///
    /// Gives every product the same report `variant_stock` would.
    async fn stock_for_products(
        &self,
        products: &[ProductSummary],
    ) -> StoreResult<HashMap<i64, VariantStockReport>> {
        if products.is_empty() {
            return Ok(HashMap::new());
        }

        let ids: Vec<i64> = products.iter().map(|p| p.id).collect();
        let (imports, exports, transfers) = tokio::try_join!(
            self.store.list_lines_for_products(
                MovementKind::Import,
                &ids,
                counted_statuses(MovementKind::Import, CountScope::ByVariant),
            ),
            self.store.list_lines_for_products(
                MovementKind::Export,
                &ids,
                counted_statuses(MovementKind::Export, CountScope::ByVariant),
            ),
            self.store.list_lines_for_products(
                MovementKind::Transfer,
                &ids,
                counted_statuses(MovementKind::Transfer, CountScope::ByVariant),
            ),
        )?;

        Ok(stock::reconcile_catalog(imports, exports, transfers))
    }

    /// Products with at least one variant whose remaining stock is below `threshold`
    pub async fn low_stock(&self, threshold: i64) -> AppResult<Vec<LowStockProduct>> {
        let products = self.store.list_products(&ProductFilter::default()).await?;
        let mut catalog = self.stock_for_products(&products).await?;

        let entries: Vec<LowStockProduct> = products
            .into_iter()
            .filter_map(|product| {
                let report = catalog.remove(&product.id).unwrap_or_default();
                stock::low_stock_entry(product, &report, threshold)
            })
            .collect();

        tracing::info!(
            "Low-stock report: {} products below threshold {}",
            entries.len(),
            threshold
        );

        Ok(entries)
    }

    /// Products with at least one variant exported beyond what was imported
    pub async fn over_exported(&self) -> AppResult<Vec<OverExportedProduct>> {
        let products = self.store.list_products(&ProductFilter::default()).await?;
        let mut catalog = self.stock_for_products(&products).await?;

        let entries: Vec<OverExportedProduct> = products
            .into_iter()
            .filter_map(|product| {
                let report = catalog.remove(&product.id).unwrap_or_default();
                stock::over_exported_entry(product, &report)
            })
            .collect();

        tracing::info!("Over-exported report: {} products", entries.len());

        Ok(entries)
    }

    /// Product listing with full per-variant stock
    pub async fn products_with_stock(
        &self,
        filter: &ProductFilter,
    ) -> AppResult<Vec<ProductWithStock>> {
        let products = self.store.list_products(filter).await?;
        let mut catalog = self.stock_for_products(&products).await?;

        Ok(products
            .into_iter()
            .map(|product| {
                let report = catalog.remove(&product.id).unwrap_or_default();
                stock::with_stock(product, report)
            })
            .collect())
    }

    /// Fetch a product or fail with NotFound
    pub async fn require_product(&self, product_id: i64) -> AppResult<ProductSummary> {
        self.store
            .find_product(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {}", product_id)))
    }

    /// Colors attached to a product; an empty list is reported as NotFound
    pub async fn product_colors(&self, product_id: i64) -> AppResult<Vec<ProductColor>> {
        let colors = self.store.list_product_colors(product_id).await?;
        if colors.is_empty() {
            return Err(AppError::NotFound("Colors for this product".to_string()));
        }
        Ok(colors)
    }

    /// Export report rows as CSV
    pub fn export_to_csv<T: Serialize>(rows: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for row in rows {
            wtr.serialize(row)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }
}
