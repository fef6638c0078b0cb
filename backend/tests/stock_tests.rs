//! Stock reconciliation tests
//!
//! Tests for derived stock including:
//! - Per-variant stock and the document statuses that count toward it
//! - Whole-product totals and the no-activity outcome
//! - Low-stock and over-exported reports built from bulk reads

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::models::{
    DocumentStatus, MovementKind, MovementLine, ProductColor, ProductFilter, ProductSummary,
    StockTotalsOutcome,
};
use shared::stock;
use stock_backend::error::AppError;
use stock_backend::services::{StockCsvRow, StockService};
use stock_backend::store::{InMemoryMovementStore, MovementStore, StoreError, StoreResult};

// ============================================================================
// Helpers
// ============================================================================

fn product(id: i64, title: &str) -> ProductSummary {
    ProductSummary {
        id,
        title: title.to_string(),
        slug: title.to_lowercase().replace(' ', "-"),
        sku: Some(format!("SKU-{:03}", id)),
        quantity: 0,
        price: Decimal::new(19900, 2),
        discount: None,
        category_id: Some(1),
        // Higher ids are older so the newest-first order is predictable
        created_at: Utc::now() - Duration::minutes(id),
    }
}

fn line(product_id: i64, title: &str, size: Option<&str>, quantity: i32) -> MovementLine {
    MovementLine::new(product_id, 1, title, size, quantity)
}

async fn store_with_products(ids: &[i64]) -> Arc<InMemoryMovementStore> {
    let store = Arc::new(InMemoryMovementStore::new());
    for &id in ids {
        store.insert_product(product(id, &format!("Product {}", id))).await;
    }
    store
}

async fn record(
    store: &InMemoryMovementStore,
    kind: MovementKind,
    status: DocumentStatus,
    lines: Vec<MovementLine>,
) -> i64 {
    store
        .record_document(kind, status, lines)
        .await
        .expect("lines are valid")
}

/// Store whose every read fails
struct UnavailableStore;

#[async_trait]
impl MovementStore for UnavailableStore {
    async fn list_lines(
        &self,
        _kind: MovementKind,
        _product_id: i64,
        _statuses: &[DocumentStatus],
    ) -> StoreResult<Vec<MovementLine>> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn list_lines_for_products(
        &self,
        _kind: MovementKind,
        _product_ids: &[i64],
        _statuses: &[DocumentStatus],
    ) -> StoreResult<Vec<MovementLine>> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn sum_quantity(
        &self,
        _kind: MovementKind,
        _product_id: i64,
        _statuses: &[DocumentStatus],
    ) -> StoreResult<Option<i64>> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn list_products(&self, _filter: &ProductFilter) -> StoreResult<Vec<ProductSummary>> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn find_product(&self, _product_id: i64) -> StoreResult<Option<ProductSummary>> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn list_product_colors(&self, _product_id: i64) -> StoreResult<Vec<ProductColor>> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn ping(&self) -> StoreResult<()> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Red/M imported twice then over-exported
    #[tokio::test]
    async fn test_over_exported_variant_example() {
        let store = store_with_products(&[1]).await;
        record(
            &store,
            MovementKind::Import,
            DocumentStatus::Completed,
            vec![line(1, "Red", Some("M"), 10), line(1, "Red", Some("M"), 5)],
        )
        .await;
        record(
            &store,
            MovementKind::Export,
            DocumentStatus::Exported,
            vec![line(1, "Red", Some("M"), 20)],
        )
        .await;

        let service = StockService::new(store.clone());
        let report = service.variant_stock(1).await.unwrap();

        assert_eq!(report.variants.len(), 1);
        assert_eq!(report.variants[0].imported_quantity, 15);
        assert_eq!(report.variants[0].exported_and_transferred_quantity, 20);
        assert_eq!(report.variants[0].remaining_quantity, -5);

        let over = service.over_exported().await.unwrap();
        assert_eq!(over.len(), 1);
        assert_eq!(over[0].product.id, 1);
        assert_eq!(over[0].total_remaining, -5);
    }

    /// Only completed imports count
    #[tokio::test]
    async fn test_pending_import_not_counted() {
        let store = store_with_products(&[1]).await;
        record(
            &store,
            MovementKind::Import,
            DocumentStatus::Completed,
            vec![line(1, "Red", Some("M"), 10)],
        )
        .await;
        record(
            &store,
            MovementKind::Import,
            DocumentStatus::Pending,
            vec![line(1, "Red", Some("M"), 100)],
        )
        .await;

        let report = StockService::new(store).variant_stock(1).await.unwrap();
        assert_eq!(report.total_quantity, 10);
    }

    /// Blue/L with only pending exports keeps all of its stock
    #[tokio::test]
    async fn test_pending_exports_never_reduce_stock() {
        let store = store_with_products(&[1]).await;
        record(
            &store,
            MovementKind::Import,
            DocumentStatus::Completed,
            vec![line(1, "Blue", Some("L"), 20)],
        )
        .await;
        record(
            &store,
            MovementKind::Export,
            DocumentStatus::Pending,
            vec![line(1, "Blue", Some("L"), 5)],
        )
        .await;

        let report = StockService::new(store).variant_stock(1).await.unwrap();
        assert_eq!(report.variants[0].exported_and_transferred_quantity, 0);
        assert_eq!(report.variants[0].remaining_quantity, 20);
    }

    /// Prepared exports count in both computations
    #[tokio::test]
    async fn test_prepared_export_counted() {
        let store = store_with_products(&[1]).await;
        record(
            &store,
            MovementKind::Import,
            DocumentStatus::Completed,
            vec![line(1, "Red", None, 10)],
        )
        .await;
        record(
            &store,
            MovementKind::Export,
            DocumentStatus::Prepared,
            vec![line(1, "Red", None, 3)],
        )
        .await;

        let service = StockService::new(store);
        assert_eq!(service.variant_stock(1).await.unwrap().variants[0].remaining_quantity, 7);
        assert_eq!(
            service.stock_totals(1).await.unwrap().totals().remaining_quantity,
            7
        );
    }

    /// Prepared transfers count in totals but not per variant
    #[tokio::test]
    async fn test_prepared_transfer_asymmetry() {
        let store = store_with_products(&[1]).await;
        record(
            &store,
            MovementKind::Import,
            DocumentStatus::Completed,
            vec![line(1, "Red", Some("M"), 10)],
        )
        .await;
        record(
            &store,
            MovementKind::Transfer,
            DocumentStatus::Prepared,
            vec![line(1, "Red", Some("M"), 4)],
        )
        .await;

        let service = StockService::new(store);
        let report = service.variant_stock(1).await.unwrap();
        assert_eq!(report.variants[0].remaining_quantity, 10);

        let totals = service.stock_totals(1).await.unwrap().totals();
        assert_eq!(totals.total_transferred, 4);
        assert_eq!(totals.remaining_quantity, 6);
    }

    /// Exports without any completed import report nothing per variant
    #[tokio::test]
    async fn test_no_imports_reports_no_variants() {
        let store = store_with_products(&[1]).await;
        record(
            &store,
            MovementKind::Export,
            DocumentStatus::Exported,
            vec![line(1, "Red", Some("M"), 8)],
        )
        .await;

        let service = StockService::new(store);
        let report = service.variant_stock(1).await.unwrap();
        assert!(report.is_empty());
        assert_eq!(report.total_quantity, 0);

        // The product is absent from the over-exported report as well
        assert!(service.over_exported().await.unwrap().is_empty());

        // Totals still see the export
        let totals = service.stock_totals(1).await.unwrap().totals();
        assert_eq!(totals.remaining_quantity, -8);
    }

    /// No rows at all is distinct from rows netting to zero
    #[tokio::test]
    async fn test_totals_no_activity() {
        let store = store_with_products(&[1, 2]).await;
        record(
            &store,
            MovementKind::Import,
            DocumentStatus::Cancelled,
            vec![line(1, "Red", Some("M"), 8)],
        )
        .await;
        record(
            &store,
            MovementKind::Import,
            DocumentStatus::Completed,
            vec![line(2, "Red", Some("M"), 8)],
        )
        .await;
        record(
            &store,
            MovementKind::Export,
            DocumentStatus::Completed,
            vec![line(2, "Red", Some("M"), 8)],
        )
        .await;

        let service = StockService::new(store);
        assert_eq!(
            service.stock_totals(1).await.unwrap(),
            StockTotalsOutcome::NoActivity
        );

        let zero_net = service.stock_totals(2).await.unwrap();
        assert!(zero_net.has_activity());
        assert_eq!(zero_net.totals().remaining_quantity, 0);
    }

    /// Import-only products keep everything they imported
    #[tokio::test]
    async fn test_totals_import_only() {
        let store = store_with_products(&[1]).await;
        record(
            &store,
            MovementKind::Import,
            DocumentStatus::Completed,
            vec![line(1, "Red", Some("M"), 12), line(1, "Blue", Some("S"), 30)],
        )
        .await;

        let totals = StockService::new(store).stock_totals(1).await.unwrap().totals();
        assert_eq!(totals.total_imported, 42);
        assert_eq!(totals.remaining_quantity, totals.total_imported);
    }

    /// Large line quantities are summed in 64 bits by both computations
    #[tokio::test]
    async fn test_large_quantities_agree_across_computations() {
        let store = store_with_products(&[1]).await;
        record(
            &store,
            MovementKind::Import,
            DocumentStatus::Completed,
            vec![
                line(1, "Red", Some("M"), i32::MAX),
                line(1, "Red", Some("M"), i32::MAX),
                line(1, "Red", Some("M"), i32::MAX),
            ],
        )
        .await;
        record(
            &store,
            MovementKind::Export,
            DocumentStatus::Exported,
            vec![line(1, "Red", Some("M"), i32::MAX)],
        )
        .await;

        let service = StockService::new(store);
        let report = service.variant_stock(1).await.unwrap();
        let totals = service.stock_totals(1).await.unwrap().totals();

        assert_eq!(report.total_quantity, 3 * i64::from(i32::MAX));
        assert_eq!(report.variants[0].remaining_quantity, 2 * i64::from(i32::MAX));
        assert_eq!(totals.total_imported, report.total_quantity);
        assert_eq!(totals.remaining_quantity, report.variants[0].remaining_quantity);
    }

    /// Changing a document's status changes which lines count
    #[tokio::test]
    async fn test_status_change_is_reflected_on_next_read() {
        let store = store_with_products(&[1]).await;
        record(
            &store,
            MovementKind::Import,
            DocumentStatus::Completed,
            vec![line(1, "Red", Some("M"), 10)],
        )
        .await;
        let export_id = record(
            &store,
            MovementKind::Export,
            DocumentStatus::Pending,
            vec![line(1, "Red", Some("M"), 6)],
        )
        .await;

        let service = StockService::new(store.clone());
        assert_eq!(service.variant_stock(1).await.unwrap().variants[0].remaining_quantity, 10);

        store
            .set_document_status(MovementKind::Export, export_id, DocumentStatus::Exported)
            .await
            .unwrap();
        assert_eq!(service.variant_stock(1).await.unwrap().variants[0].remaining_quantity, 4);
    }

    #[tokio::test]
    async fn test_set_status_unknown_document() {
        let store = InMemoryMovementStore::new();
        let result = store
            .set_document_status(MovementKind::Transfer, 42, DocumentStatus::Completed)
            .await;
        assert!(matches!(
            result,
            Err(StoreError::DocumentNotFound { kind: MovementKind::Transfer, id: 42 })
        ));
    }

    #[tokio::test]
    async fn test_record_rejects_negative_quantity() {
        let store = InMemoryMovementStore::new();
        let result = store
            .record_document(
                MovementKind::Import,
                DocumentStatus::Completed,
                vec![line(1, "Red", Some("M"), -1)],
            )
            .await;
        assert!(matches!(result, Err(StoreError::InvalidLine(_))));
    }

    /// Low-stock entries hold only flagged variants, newest product first
    #[tokio::test]
    async fn test_low_stock_report() {
        let store = store_with_products(&[1, 2, 3]).await;
        record(
            &store,
            MovementKind::Import,
            DocumentStatus::Completed,
            vec![
                line(1, "Red", Some("M"), 10),
                line(1, "Blue", Some("L"), 100),
                line(2, "Red", Some("M"), 2),
                line(3, "Red", Some("M"), 50),
            ],
        )
        .await;
        record(
            &store,
            MovementKind::Export,
            DocumentStatus::Completed,
            vec![line(1, "Red", Some("M"), 8)],
        )
        .await;

        let products = StockService::new(store).low_stock(5).await.unwrap();
        let ids: Vec<i64> = products.iter().map(|p| p.product.id).collect();
        assert_eq!(ids, vec![1, 2]);

        let first = &products[0];
        assert_eq!(first.stock_by_color.len(), 1);
        assert_eq!(first.stock_by_color[0].color_title, "Red");
        assert_eq!(first.total_imported, 110);
        assert_eq!(first.total_exported_and_transferred, 8);
        assert_eq!(first.total_remaining, 2);
    }

    #[tokio::test]
    async fn test_products_with_stock_filters_by_search() {
        let store = Arc::new(InMemoryMovementStore::new());
        store.insert_product(product(1, "Linen Shirt")).await;
        store.insert_product(product(2, "Wool Coat")).await;
        record(
            &store,
            MovementKind::Import,
            DocumentStatus::Completed,
            vec![line(1, "White", Some("M"), 9), line(2, "Grey", Some("L"), 4)],
        )
        .await;

        let service = StockService::new(store);
        let filter = ProductFilter {
            search: Some("shirt".to_string()),
            category_id: None,
        };
        let products = service.products_with_stock(&filter).await.unwrap();

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].product.title, "Linen Shirt");
        assert_eq!(products[0].total_imported, 9);
        assert_eq!(products[0].total_remaining, 9);

        let all = service.products_with_stock(&ProductFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_products_with_stock_filters_by_category() {
        let store = Arc::new(InMemoryMovementStore::new());
        let mut shirt = product(1, "Linen Shirt");
        shirt.category_id = Some(3);
        let mut coat = product(2, "Wool Coat");
        coat.category_id = Some(8);
        store.insert_product(shirt).await;
        store.insert_product(coat).await;
        record(
            &store,
            MovementKind::Import,
            DocumentStatus::Completed,
            vec![line(1, "White", Some("M"), 9), line(2, "Grey", Some("L"), 4)],
        )
        .await;

        let service = StockService::new(store);
        let filter = ProductFilter {
            search: None,
            category_id: Some(8),
        };
        let products = service.products_with_stock(&filter).await.unwrap();

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].product.title, "Wool Coat");
        assert_eq!(products[0].total_remaining, 4);

        let filter = ProductFilter {
            search: Some("shirt".to_string()),
            category_id: Some(8),
        };
        assert!(service.products_with_stock(&filter).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_require_product_not_found() {
        let store = store_with_products(&[1]).await;
        let result = StockService::new(store).require_product(99).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_product_colors() {
        let store = store_with_products(&[1, 2]).await;
        store
            .insert_product_color(ProductColor {
                id: 1,
                product_id: 1,
                color_id: 3,
                color_title: "Red".to_string(),
            })
            .await;

        let service = StockService::new(store);
        assert_eq!(service.product_colors(1).await.unwrap().len(), 1);
        assert!(matches!(
            service.product_colors(2).await,
            Err(AppError::NotFound(_))
        ));
    }

    /// Store failures surface unchanged
    #[tokio::test]
    async fn test_store_failure_propagates() {
        let service = StockService::new(Arc::new(UnavailableStore));

        assert!(matches!(
            service.variant_stock(1).await,
            Err(AppError::Store(StoreError::Unavailable(_)))
        ));
        assert!(matches!(
            service.stock_totals(1).await,
            Err(AppError::Store(StoreError::Unavailable(_)))
        ));
        assert!(matches!(
            service.low_stock(5).await,
            Err(AppError::Store(StoreError::Unavailable(_)))
        ));
    }

    #[test]
    fn test_csv_export() {
        let p = product(7, "Denim Jacket");
        let report = stock::reconcile(&[line(7, "Blue", Some("XL"), 3)], &[], &[]);
        let rows = StockCsvRow::from_variants(&p, &report.variants);
        let csv = StockService::export_to_csv(&rows).unwrap();

        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("product_id,sku,title,color_title,size,imported_quantity,exported_and_transferred_quantity,remaining_quantity")
        );
        assert_eq!(lines.next(), Some("7,SKU-007,Denim Jacket,Blue,XL,3,0,3"));
        assert_eq!(lines.next(), None);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn title_strategy() -> impl Strategy<Value = &'static str> {
        prop_oneof![Just("Red"), Just("Blue"), Just("Green")]
    }

    fn size_strategy() -> impl Strategy<Value = Option<&'static str>> {
        prop_oneof![Just(None), Just(Some("")), Just(Some("S")), Just(Some("M"))]
    }

    fn line_strategy() -> impl Strategy<Value = MovementLine> {
        (1i64..=3, 0i64..=5, title_strategy(), size_strategy(), 0i32..=50).prop_map(
            |(product_id, color, title, size, quantity)| {
                MovementLine::new(product_id, color, title, size, quantity)
            },
        )
    }

    fn lines_strategy() -> impl Strategy<Value = Vec<MovementLine>> {
        prop::collection::vec(line_strategy(), 0..25)
    }

    fn for_product(lines: &[MovementLine], product_id: i64) -> Vec<MovementLine> {
        lines
            .iter()
            .filter(|l| l.product_id == product_id)
            .cloned()
            .collect()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// totalQuantity is the sum of imported quantities
        #[test]
        fn prop_total_quantity_matches_variants(
            imports in lines_strategy(),
            exports in lines_strategy(),
            transfers in lines_strategy(),
        ) {
            let report = stock::reconcile(&imports, &exports, &transfers);
            let sum: i64 = report.variants.iter().map(|v| v.imported_quantity).sum();
            prop_assert_eq!(report.total_quantity, sum);
        }

        /// remaining = imported - exported and transferred, for every variant
        #[test]
        fn prop_remaining_arithmetic(
            imports in lines_strategy(),
            exports in lines_strategy(),
            transfers in lines_strategy(),
        ) {
            let report = stock::reconcile(&imports, &exports, &transfers);
            for v in &report.variants {
                prop_assert_eq!(
                    v.remaining_quantity,
                    v.imported_quantity - v.exported_and_transferred_quantity
                );
            }
        }

        /// Output variants are exactly the distinct import keys
        #[test]
        fn prop_only_import_keys_seed_output(
            imports in lines_strategy(),
            exports in lines_strategy(),
        ) {
            let report = stock::reconcile(&imports, &exports, &[]);
            let tallies = stock::tally_by_variant(&imports);
            prop_assert_eq!(report.variants.len(), tallies.len());
            for (variant, tally) in report.variants.iter().zip(tallies.iter()) {
                prop_assert_eq!(&variant.key(), &tally.key);
            }
        }

        /// Imported quantity is conserved by grouping
        #[test]
        fn prop_grouping_conserves_quantity(imports in lines_strategy()) {
            let total: i64 = imports.iter().map(|l| i64::from(l.quantity)).sum();
            let report = stock::reconcile(&imports, &[], &[]);
            prop_assert_eq!(report.total_quantity, total);
        }

        /// Bulk reconciliation matches reconciling each product alone
        #[test]
        fn prop_catalog_matches_single_product(
            imports in lines_strategy(),
            exports in lines_strategy(),
            transfers in lines_strategy(),
        ) {
            let catalog = stock::reconcile_catalog(
                imports.clone(),
                exports.clone(),
                transfers.clone(),
            );
            for product_id in 1..=3 {
                let single = stock::reconcile(
                    &for_product(&imports, product_id),
                    &for_product(&exports, product_id),
                    &for_product(&transfers, product_id),
                );
                let bulk = catalog.get(&product_id).cloned().unwrap_or_default();
                prop_assert_eq!(bulk, single);
            }
        }

        /// A product is over-exported iff one of its variants is negative
        #[test]
        fn prop_over_exported_iff_negative_variant(
            imports in lines_strategy(),
            exports in lines_strategy(),
        ) {
            let report = stock::reconcile(&for_product(&imports, 1), &for_product(&exports, 1), &[]);
            let has_negative = report.variants.iter().any(|v| v.remaining_quantity < 0);
            let entry = stock::over_exported_entry(product(1, "Shirt"), &report);
            prop_assert_eq!(entry.is_some(), has_negative);
        }

        /// Low-stock entries contain exactly the variants below the threshold
        #[test]
        fn prop_low_stock_flags_only_below_threshold(
            imports in lines_strategy(),
            exports in lines_strategy(),
            threshold in -20i64..=60,
        ) {
            let report = stock::reconcile(&for_product(&imports, 1), &for_product(&exports, 1), &[]);
            let expected = report.variants.iter().filter(|v| v.remaining_quantity < threshold).count();
            match stock::low_stock_entry(product(1, "Shirt"), &report, threshold) {
                Some(entry) => {
                    prop_assert_eq!(entry.stock_by_color.len(), expected);
                    prop_assert!(entry.stock_by_color.iter().all(|v| v.remaining_quantity < threshold));
                }
                None => prop_assert_eq!(expected, 0),
            }
        }

        /// The service's bulk report agrees with per-product variant stock
        #[test]
        fn prop_service_over_exported_matches_variant_stock(
            imports in lines_strategy(),
            exports in lines_strategy(),
            transfers in lines_strategy(),
        ) {
            let (over_ids, expected_ids) = tokio_test::block_on(async {
                let store = store_with_products(&[1, 2, 3]).await;
                record(&store, MovementKind::Import, DocumentStatus::Completed, imports).await;
                record(&store, MovementKind::Export, DocumentStatus::Exported, exports).await;
                record(&store, MovementKind::Transfer, DocumentStatus::Completed, transfers).await;

                let service = StockService::new(store);
                let over: Vec<i64> = service
                    .over_exported()
                    .await
                    .unwrap()
                    .iter()
                    .map(|p| p.product.id)
                    .collect();

                let mut expected = Vec::new();
                for product_id in 1..=3 {
                    let report = service.variant_stock(product_id).await.unwrap();
                    if report.variants.iter().any(|v| v.remaining_quantity < 0) {
                        expected.push(product_id);
                    }
                }
                (over, expected)
            });

            prop_assert_eq!(over_ids, expected_ids);
        }
    }
}
