//! Stock reconciliation across import, export and transfer movements
//!
//! Everything here is pure: callers fetch the movement lines (already filtered
//! by product and document status) and these functions group, merge and
//! derive remaining stock from them.

use std::collections::HashMap;

use crate::models::{
    DocumentStatus, LowStockProduct, MovementKind, MovementLine, OverExportedProduct,
    ProductSummary, ProductWithStock, StockTotals, StockTotalsOutcome, VariantKey, VariantStock,
    VariantStockReport,
};

// ============================================================================
// Counted statuses
// ============================================================================

/// Import documents count once completed
pub const IMPORT_COUNTED: &[DocumentStatus] = &[DocumentStatus::Completed];

/// Export documents count as soon as goods are prepared
pub const EXPORT_COUNTED: &[DocumentStatus] = &[
    DocumentStatus::Exported,
    DocumentStatus::Completed,
    DocumentStatus::Prepared,
];

/// Transfer statuses counted in per-variant stock (PREPARED is not counted)
pub const TRANSFER_COUNTED_BY_VARIANT: &[DocumentStatus] =
    &[DocumentStatus::Exported, DocumentStatus::Completed];

/// Transfer statuses counted in whole-product totals (PREPARED is counted)
pub const TRANSFER_COUNTED_IN_TOTALS: &[DocumentStatus] = &[
    DocumentStatus::Exported,
    DocumentStatus::Completed,
    DocumentStatus::Prepared,
];

/// The computation a status filter is requested for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountScope {
    ByVariant,
    Totals,
}

/// Document statuses whose lines count toward stock for a movement kind
pub fn counted_statuses(kind: MovementKind, scope: CountScope) -> &'static [DocumentStatus] {
    match (kind, scope) {
        (MovementKind::Import, _) => IMPORT_COUNTED,
        (MovementKind::Export, _) => EXPORT_COUNTED,
        (MovementKind::Transfer, CountScope::ByVariant) => TRANSFER_COUNTED_BY_VARIANT,
        (MovementKind::Transfer, CountScope::Totals) => TRANSFER_COUNTED_IN_TOTALS,
    }
}

// ============================================================================
// Per-variant reconciliation
// ============================================================================

/// Summed quantity of one variant within a single movement source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantTally {
    pub key: VariantKey,
    /// Color id of the first line seen for this key
    pub color: i64,
    pub quantity: i64,
}

/// Group lines by variant and sum their quantities, keeping first-seen order
pub fn tally_by_variant<'a>(lines: impl IntoIterator<Item = &'a MovementLine>) -> Vec<VariantTally> {
    let mut index: HashMap<VariantKey, usize> = HashMap::new();
    let mut tallies: Vec<VariantTally> = Vec::new();

    for line in lines {
        let key = VariantKey::from_line(line);
        match index.get(&key) {
            Some(&position) => tallies[position].quantity += i64::from(line.quantity),
            None => {
                index.insert(key.clone(), tallies.len());
                tallies.push(VariantTally {
                    key,
                    color: line.color,
                    quantity: i64::from(line.quantity),
                });
            }
        }
    }

    tallies
}

fn quantity_by_variant(lines: &[MovementLine]) -> HashMap<VariantKey, i64> {
    tally_by_variant(lines)
        .into_iter()
        .map(|tally| (tally.key, tally.quantity))
        .collect()
}

/// Merge the three movement sources of one product into per-variant stock.
///
/// Only variants that were imported appear in the result. Variants that were
/// exported or transferred without ever being imported are dropped, so a
/// product with no counted imports reports nothing at all.
pub fn reconcile(
    imports: &[MovementLine],
    exports: &[MovementLine],
    transfers: &[MovementLine],
) -> VariantStockReport {
    let exported = quantity_by_variant(exports);
    let transferred = quantity_by_variant(transfers);

    let variants: Vec<VariantStock> = tally_by_variant(imports)
        .into_iter()
        .map(|tally| {
            let outbound = exported.get(&tally.key).copied().unwrap_or(0)
                + transferred.get(&tally.key).copied().unwrap_or(0);
            VariantStock {
                color: tally.color,
                color_title: tally.key.color_title,
                size: tally.key.size,
                imported_quantity: tally.quantity,
                exported_and_transferred_quantity: outbound,
                remaining_quantity: tally.quantity - outbound,
            }
        })
        .collect();

    let total_quantity = variants.iter().map(|v| v.imported_quantity).sum();

    VariantStockReport {
        variants,
        total_quantity,
    }
}

/// Split lines by product, preserving their relative order
pub fn group_by_product(lines: Vec<MovementLine>) -> HashMap<i64, Vec<MovementLine>> {
    let mut grouped: HashMap<i64, Vec<MovementLine>> = HashMap::new();
    for line in lines {
        grouped.entry(line.product_id).or_default().push(line);
    }
    grouped
}

/// Reconcile many products at once from catalog-wide movement lines.
///
/// Produces, for every product, the same report `reconcile` would produce
/// from that product's lines alone. Products without counted imports are
/// absent from the map.
pub fn reconcile_catalog(
    imports: Vec<MovementLine>,
    exports: Vec<MovementLine>,
    transfers: Vec<MovementLine>,
) -> HashMap<i64, VariantStockReport> {
    let mut exports = group_by_product(exports);
    let mut transfers = group_by_product(transfers);

    group_by_product(imports)
        .into_iter()
        .map(|(product_id, product_imports)| {
            let product_exports = exports.remove(&product_id).unwrap_or_default();
            let product_transfers = transfers.remove(&product_id).unwrap_or_default();
            let report = reconcile(&product_imports, &product_exports, &product_transfers);
            (product_id, report)
        })
        .collect()
}

// ============================================================================
// Whole-product totals
// ============================================================================

/// Combine raw quantity sums into totals.
///
/// Each argument is `None` when no line of that kind matched at all.
pub fn summarize_totals(
    imported: Option<i64>,
    exported: Option<i64>,
    transferred: Option<i64>,
) -> StockTotalsOutcome {
    if imported.is_none() && exported.is_none() && transferred.is_none() {
        return StockTotalsOutcome::NoActivity;
    }

    let total_imported = imported.unwrap_or(0);
    let total_exported = exported.unwrap_or(0);
    let total_transferred = transferred.unwrap_or(0);
    let total_exported_and_transferred = total_exported + total_transferred;

    StockTotalsOutcome::Computed(StockTotals {
        total_imported,
        total_exported,
        total_transferred,
        total_exported_and_transferred,
        remaining_quantity: total_imported - total_exported_and_transferred,
    })
}

// ============================================================================
// Report entries
// ============================================================================

/// Low-stock entry for a product, if any variant is below `threshold`
pub fn low_stock_entry(
    product: ProductSummary,
    report: &VariantStockReport,
    threshold: i64,
) -> Option<LowStockProduct> {
    let flagged: Vec<VariantStock> = report
        .variants
        .iter()
        .filter(|v| v.remaining_quantity < threshold)
        .cloned()
        .collect();

    if flagged.is_empty() {
        return None;
    }

    let total_exported_and_transferred = flagged
        .iter()
        .map(|v| v.exported_and_transferred_quantity)
        .sum();
    let total_remaining = flagged.iter().map(|v| v.remaining_quantity).sum();

    Some(LowStockProduct {
        product,
        stock_by_color: flagged,
        total_imported: report.total_quantity,
        total_exported_and_transferred,
        total_remaining,
    })
}

/// Over-exported entry for a product, if any variant has negative stock
pub fn over_exported_entry(
    product: ProductSummary,
    report: &VariantStockReport,
) -> Option<OverExportedProduct> {
    let negative: Vec<VariantStock> = report
        .variants
        .iter()
        .filter(|v| v.remaining_quantity < 0)
        .cloned()
        .collect();

    if negative.is_empty() {
        return None;
    }

    Some(OverExportedProduct {
        product,
        negative_stock_colors: negative,
        total_remaining: report.total_remaining(),
    })
}

/// Listing entry carrying every variant of the product
pub fn with_stock(product: ProductSummary, report: VariantStockReport) -> ProductWithStock {
    let total_exported_and_transferred = report.total_exported_and_transferred();
    let total_remaining = report.total_remaining();

    ProductWithStock {
        product,
        total_imported: report.total_quantity,
        total_exported_and_transferred,
        total_remaining,
        stock_by_color: report.variants,
    }
}
