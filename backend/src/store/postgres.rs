//! PostgreSQL movement store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::models::{
    DocumentStatus, MovementKind, MovementLine, ProductColor, ProductFilter, ProductSummary,
};
use sqlx::{FromRow, PgPool};

use super::{MovementStore, StoreResult};

/// Movement store backed by the import/export/transfer detail tables
#[derive(Clone)]
pub struct PgMovementStore {
    db: PgPool,
}

/// Row for movement line queries
#[derive(Debug, FromRow)]
struct LineRow {
    product_id: i64,
    color: i64,
    color_title: String,
    size: Option<String>,
    quantity: i32,
}

impl From<LineRow> for MovementLine {
    fn from(row: LineRow) -> Self {
        MovementLine {
            product_id: row.product_id,
            color: row.color,
            color_title: row.color_title,
            size: row.size,
            quantity: row.quantity,
        }
    }
}

/// Row for product queries
#[derive(Debug, FromRow)]
struct ProductRow {
    id: i64,
    title: String,
    slug: String,
    sku: Option<String>,
    quantity: i64,
    price: Decimal,
    discount: Option<Decimal>,
    category_id: Option<i64>,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for ProductSummary {
    fn from(row: ProductRow) -> Self {
        ProductSummary {
            id: row.id,
            title: row.title,
            slug: row.slug,
            sku: row.sku,
            quantity: row.quantity,
            price: row.price,
            discount: row.discount,
            category_id: row.category_id,
            created_at: row.created_at,
        }
    }
}

/// Row for product color queries
#[derive(Debug, FromRow)]
struct ProductColorRow {
    id: i64,
    product_id: i64,
    color_id: i64,
    color_title: String,
}

/// Detail table, document table and the foreign key joining them
fn tables(kind: MovementKind) -> (&'static str, &'static str, &'static str) {
    match kind {
        MovementKind::Import => ("import_details", "imports", "import_id"),
        MovementKind::Export => ("export_details", "exports", "export_id"),
        MovementKind::Transfer => ("transfer_details", "transfers", "transfer_id"),
    }
}

fn status_names(statuses: &[DocumentStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

/// Escape LIKE wildcards so the search term matches literally
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

const PRODUCT_COLUMNS: &str =
    "id, title, slug, sku, quantity, price, discount, category_id, created_at";

impl PgMovementStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MovementStore for PgMovementStore {
    async fn list_lines(
        &self,
        kind: MovementKind,
        product_id: i64,
        statuses: &[DocumentStatus],
    ) -> StoreResult<Vec<MovementLine>> {
        let (detail, document, fk) = tables(kind);
        let query = format!(
            r#"
            SELECT d.product_id, d.color, d.color_title, d.size, d.quantity
            FROM {detail} d
            JOIN {document} doc ON doc.id = d.{fk}
            WHERE d.product_id = $1 AND doc.status = ANY($2)
            ORDER BY d.id
            "#
        );

        let rows = sqlx::query_as::<_, LineRow>(&query)
            .bind(product_id)
            .bind(status_names(statuses))
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().map(MovementLine::from).collect())
    }

    async fn list_lines_for_products(
        &self,
        kind: MovementKind,
        product_ids: &[i64],
        statuses: &[DocumentStatus],
    ) -> StoreResult<Vec<MovementLine>> {
        let (detail, document, fk) = tables(kind);
        let query = format!(
            r#"
            SELECT d.product_id, d.color, d.color_title, d.size, d.quantity
            FROM {detail} d
            JOIN {document} doc ON doc.id = d.{fk}
            WHERE d.product_id = ANY($1) AND doc.status = ANY($2)
            ORDER BY d.product_id, d.id
            "#
        );

        let rows = sqlx::query_as::<_, LineRow>(&query)
            .bind(product_ids.to_vec())
            .bind(status_names(statuses))
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().map(MovementLine::from).collect())
    }

    async fn sum_quantity(
        &self,
        kind: MovementKind,
        product_id: i64,
        statuses: &[DocumentStatus],
    ) -> StoreResult<Option<i64>> {
        let (detail, document, fk) = tables(kind);
        let query = format!(
            r#"
            SELECT SUM(d.quantity)::BIGINT
            FROM {detail} d
            JOIN {document} doc ON doc.id = d.{fk}
            WHERE d.product_id = $1 AND doc.status = ANY($2)
            "#
        );

        let total = sqlx::query_scalar::<_, Option<i64>>(&query)
            .bind(product_id)
            .bind(status_names(statuses))
            .fetch_one(&self.db)
            .await?;

        Ok(total)
    }

    async fn list_products(&self, filter: &ProductFilter) -> StoreResult<Vec<ProductSummary>> {
        let pattern = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(like_pattern);

        let query = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE ($1::TEXT IS NULL OR title ILIKE $1 OR slug ILIKE $1)
              AND ($2::BIGINT IS NULL OR category_id = $2)
            ORDER BY created_at DESC
            "#
        );

        let rows = sqlx::query_as::<_, ProductRow>(&query)
            .bind(pattern)
            .bind(filter.category_id)
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().map(ProductSummary::from).collect())
    }

    async fn find_product(&self, product_id: i64) -> StoreResult<Option<ProductSummary>> {
        let query = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");

        let row = sqlx::query_as::<_, ProductRow>(&query)
            .bind(product_id)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(ProductSummary::from))
    }

    async fn list_product_colors(&self, product_id: i64) -> StoreResult<Vec<ProductColor>> {
        let rows = sqlx::query_as::<_, ProductColorRow>(
            r#"
            SELECT pc.id, pc.product_id, pc.color_id, c.title AS color_title
            FROM product_colors pc
            JOIN colors c ON c.id = pc.color_id
            WHERE pc.product_id = $1
            ORDER BY pc.id
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ProductColor {
                id: r.id,
                product_id: r.product_id,
                color_id: r.color_id,
                color_title: r.color_title,
            })
            .collect())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}
