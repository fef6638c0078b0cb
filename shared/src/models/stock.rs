//! Derived stock positions

use serde::{Deserialize, Serialize};

use super::MovementLine;

/// Identity of a product variant used to match movements across documents.
///
/// Movements are matched on the human-readable color title and the size label,
/// not on the numeric color id. `from_line` is the only place that derives a
/// key, so switching to the id touches nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantKey {
    pub color_title: String,
    pub size: String,
}

impl VariantKey {
    pub fn new(color_title: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            color_title: color_title.into(),
            size: size.into(),
        }
    }

    pub fn from_line(line: &MovementLine) -> Self {
        Self::new(
            line.color_title.clone(),
            line.size.clone().unwrap_or_default(),
        )
    }
}

impl std::fmt::Display for VariantKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.color_title, self.size)
    }
}

/// Stock position of one (color, size) variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantStock {
    pub color: i64,
    pub color_title: String,
    pub size: String,
    pub imported_quantity: i64,
    pub exported_and_transferred_quantity: i64,
    /// Negative when more was shipped out than was ever received
    pub remaining_quantity: i64,
}

impl VariantStock {
    pub fn key(&self) -> VariantKey {
        VariantKey::new(self.color_title.clone(), self.size.clone())
    }
}

/// Per-variant stock for a product, in first-seen import order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantStockReport {
    pub variants: Vec<VariantStock>,
    pub total_quantity: i64,
}

impl VariantStockReport {
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn total_exported_and_transferred(&self) -> i64 {
        self.variants
            .iter()
            .map(|v| v.exported_and_transferred_quantity)
            .sum()
    }

    pub fn total_remaining(&self) -> i64 {
        self.variants.iter().map(|v| v.remaining_quantity).sum()
    }
}

/// Whole-product totals computed from raw sums, ignoring variants
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockTotals {
    pub total_imported: i64,
    pub total_exported: i64,
    pub total_transferred: i64,
    pub total_exported_and_transferred: i64,
    pub remaining_quantity: i64,
}

/// Outcome of a whole-product totals computation.
///
/// `NoActivity` means no movement line of any kind matched, which is reported
/// differently from activity that happens to net to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockTotalsOutcome {
    NoActivity,
    Computed(StockTotals),
}

impl StockTotalsOutcome {
    pub fn has_activity(&self) -> bool {
        matches!(self, StockTotalsOutcome::Computed(_))
    }

    pub fn totals(&self) -> StockTotals {
        match self {
            StockTotalsOutcome::NoActivity => StockTotals::default(),
            StockTotalsOutcome::Computed(totals) => *totals,
        }
    }
}
