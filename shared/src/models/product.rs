//! Product models and stock report entries

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::VariantStock;

/// Product fields returned alongside stock figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub sku: Option<String>,
    /// Quantity recorded on the product itself, not derived from movements
    pub quantity: i64,
    pub price: Decimal,
    pub discount: Option<Decimal>,
    pub category_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Filter for product listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Case-insensitive substring matched against title and slug
    pub search: Option<String>,
    pub category_id: Option<i64>,
}

impl ProductFilter {
    pub fn matches(&self, product: &ProductSummary) -> bool {
        if let Some(category_id) = self.category_id {
            if product.category_id != Some(category_id) {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                product.title.to_lowercase().contains(&term)
                    || product.slug.to_lowercase().contains(&term)
            }
        }
    }
}

/// A color attached to a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductColor {
    pub id: i64,
    pub product_id: i64,
    pub color_id: i64,
    pub color_title: String,
}

/// Product with at least one variant below the low-stock threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockProduct {
    #[serde(flatten)]
    pub product: ProductSummary,
    /// Only the flagged variants
    pub stock_by_color: Vec<VariantStock>,
    /// Imported quantity across all variants of the product
    pub total_imported: i64,
    pub total_exported_and_transferred: i64,
    pub total_remaining: i64,
}

/// Product with at least one variant whose remaining quantity is negative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverExportedProduct {
    #[serde(flatten)]
    pub product: ProductSummary,
    pub negative_stock_colors: Vec<VariantStock>,
    /// Remaining quantity across all variants, not only the negative ones
    pub total_remaining: i64,
}

/// Product listing entry with its full per-variant stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductWithStock {
    #[serde(flatten)]
    pub product: ProductSummary,
    pub stock_by_color: Vec<VariantStock>,
    pub total_imported: i64,
    pub total_exported_and_transferred: i64,
    pub total_remaining: i64,
}
