//! HTTP handlers for product stock endpoints

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use shared::models::{ProductColor, ProductFilter, ProductWithStock, StockTotals, StockTotalsOutcome};
use shared::types::{ApiResponse, ReportFormat, VariantStockResponse};
use shared::validation::{parse_category_id, parse_threshold};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::{StockCsvRow, StockService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    /// Kept as text so a non-numeric value is reported as a validation error
    pub threshold: Option<String>,
    #[serde(default)]
    pub format: ReportFormat,
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub format: ReportFormat,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    #[validate(length(max = 100, message = "Search term is too long"))]
    pub search: Option<String>,
    /// Text so that a blank value means no filter
    pub category_id: Option<String>,
}

fn csv_response(filename: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

/// Get per-variant stock of a product
pub async fn get_variant_stock(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> AppResult<Json<VariantStockResponse>> {
    let service = StockService::new(state.store.clone());
    service.require_product(product_id).await?;

    let report = service.variant_stock(product_id).await?;
    let message = if report.is_empty() {
        "No variant stock recorded for this product"
    } else {
        "Fetched variant stock successfully"
    };

    Ok(Json(VariantStockResponse {
        total_quantity: report.total_quantity,
        envelope: ApiResponse::ok(message, report.variants),
    }))
}

/// Get whole-product stock totals
pub async fn get_stock_totals(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> AppResult<Json<ApiResponse<StockTotals>>> {
    let service = StockService::new(state.store.clone());
    service.require_product(product_id).await?;

    let response = match service.stock_totals(product_id).await? {
        StockTotalsOutcome::NoActivity => ApiResponse::unsuccessful(
            "No import, export or transfer data for this product",
            StockTotals::default(),
        ),
        StockTotalsOutcome::Computed(totals) => {
            ApiResponse::ok("Stock calculated successfully", totals)
        }
    };

    Ok(Json(response))
}

/// Get products with variants below a stock threshold
pub async fn get_low_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Response> {
    let threshold = parse_threshold(query.threshold.as_deref())
        .map_err(|message| AppError::validation("threshold", message))?;

    tracing::info!(
        "Low-stock report requested by {} ({}, threshold {})",
        current_user.0.user_id,
        current_user.0.role,
        threshold
    );

    let service = StockService::new(state.store.clone());
    let products = service.low_stock(threshold).await?;

    if query.format == ReportFormat::Csv {
        let rows: Vec<StockCsvRow> = products
            .iter()
            .flat_map(|p| StockCsvRow::from_variants(&p.product, &p.stock_by_color))
            .collect();
        let csv = StockService::export_to_csv(&rows)?;
        return Ok(csv_response("low_stock.csv", csv));
    }

    let message = if products.is_empty() {
        format!("No products with stock below {}", threshold)
    } else {
        format!("Products with stock below {}", threshold)
    };

    Ok(Json(ApiResponse::ok(message, products)).into_response())
}

/// Get products exported beyond their imported stock
pub async fn get_over_exported(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Response> {
    tracing::info!(
        "Over-exported report requested by {} ({})",
        current_user.0.user_id,
        current_user.0.role
    );

    let service = StockService::new(state.store.clone());
    let products = service.over_exported().await?;

    if query.format == ReportFormat::Csv {
        let rows: Vec<StockCsvRow> = products
            .iter()
            .flat_map(|p| StockCsvRow::from_variants(&p.product, &p.negative_stock_colors))
            .collect();
        let csv = StockService::export_to_csv(&rows)?;
        return Ok(csv_response("over_exported.csv", csv));
    }

    let message = if products.is_empty() {
        "No products with negative stock"
    } else {
        "Products exported beyond stock"
    };

    Ok(Json(ApiResponse::ok(message, products)).into_response())
}

/// List products with their per-variant stock
pub async fn list_products_with_stock(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> AppResult<Json<ApiResponse<Vec<ProductWithStock>>>> {
    query.validate()?;
    let category_id = parse_category_id(query.category_id.as_deref())
        .map_err(|message| AppError::validation("categoryId", message))?;

    let filter = ProductFilter {
        search: query.search,
        category_id,
    };

    let service = StockService::new(state.store.clone());
    let products = service.products_with_stock(&filter).await?;
    let message = if products.is_empty() {
        "No products found"
    } else {
        "Fetched products successfully"
    };

    Ok(Json(ApiResponse::ok(message, products)))
}

/// Get colors attached to a product
pub async fn get_product_colors(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> AppResult<Json<ApiResponse<Vec<ProductColor>>>> {
    let service = StockService::new(state.store.clone());
    let colors = service.product_colors(product_id).await?;
    Ok(Json(ApiResponse::ok("Fetched product colors successfully", colors)))
}
