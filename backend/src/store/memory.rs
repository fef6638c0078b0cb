//! In-process movement store

use async_trait::async_trait;
use shared::models::{
    DocumentStatus, MovementKind, MovementLine, ProductColor, ProductFilter, ProductSummary,
};
use shared::validation::validate_quantity;
use tokio::sync::RwLock;

use super::{MovementStore, StoreError, StoreResult};

/// Movement store kept entirely in memory.
///
/// Used for local runs without a database and by the test suites. Documents
/// hold their lines, so changing a document's status changes which lines
/// count, exactly as it does with the relational tables.
#[derive(Default)]
pub struct InMemoryMovementStore {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    products: Vec<ProductSummary>,
    product_colors: Vec<ProductColor>,
    documents: Vec<StoredDocument>,
    next_document_id: i64,
}

struct StoredDocument {
    id: i64,
    kind: MovementKind,
    status: DocumentStatus,
    lines: Vec<MovementLine>,
}

impl MemoryState {
    fn matching_lines<'a>(
        &'a self,
        kind: MovementKind,
        statuses: &'a [DocumentStatus],
    ) -> impl Iterator<Item = &'a MovementLine> + 'a {
        self.documents
            .iter()
            .filter(move |doc| doc.kind == kind && statuses.contains(&doc.status))
            .flat_map(|doc| doc.lines.iter())
    }
}

impl InMemoryMovementStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_product(&self, product: ProductSummary) {
        let mut state = self.state.write().await;
        state.products.retain(|p| p.id != product.id);
        state.products.push(product);
    }

    pub async fn insert_product_color(&self, color: ProductColor) {
        self.state.write().await.product_colors.push(color);
    }

    /// Record a document with its lines and return the document id
    pub async fn record_document(
        &self,
        kind: MovementKind,
        status: DocumentStatus,
        lines: Vec<MovementLine>,
    ) -> StoreResult<i64> {
        for line in &lines {
            validate_quantity(line.quantity).map_err(StoreError::InvalidLine)?;
        }

        let mut state = self.state.write().await;
        state.next_document_id += 1;
        let id = state.next_document_id;
        state.documents.push(StoredDocument {
            id,
            kind,
            status,
            lines,
        });
        Ok(id)
    }

    pub async fn set_document_status(
        &self,
        kind: MovementKind,
        id: i64,
        status: DocumentStatus,
    ) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let document = state
            .documents
            .iter_mut()
            .find(|doc| doc.kind == kind && doc.id == id)
            .ok_or(StoreError::DocumentNotFound { kind, id })?;
        document.status = status;
        Ok(())
    }
}

#[async_trait]
impl MovementStore for InMemoryMovementStore {
    async fn list_lines(
        &self,
        kind: MovementKind,
        product_id: i64,
        statuses: &[DocumentStatus],
    ) -> StoreResult<Vec<MovementLine>> {
        let state = self.state.read().await;
        Ok(state
            .matching_lines(kind, statuses)
            .filter(|line| line.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn list_lines_for_products(
        &self,
        kind: MovementKind,
        product_ids: &[i64],
        statuses: &[DocumentStatus],
    ) -> StoreResult<Vec<MovementLine>> {
        let state = self.state.read().await;
        Ok(state
            .matching_lines(kind, statuses)
            .filter(|line| product_ids.contains(&line.product_id))
            .cloned()
            .collect())
    }

    async fn sum_quantity(
        &self,
        kind: MovementKind,
        product_id: i64,
        statuses: &[DocumentStatus],
    ) -> StoreResult<Option<i64>> {
        let state = self.state.read().await;
        Ok(state
            .matching_lines(kind, statuses)
            .filter(|line| line.product_id == product_id)
            .map(|line| i64::from(line.quantity))
            .reduce(|acc, quantity| acc + quantity))
    }

    async fn list_products(&self, filter: &ProductFilter) -> StoreResult<Vec<ProductSummary>> {
        let state = self.state.read().await;
        let mut products: Vec<ProductSummary> = state
            .products
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn find_product(&self, product_id: i64) -> StoreResult<Option<ProductSummary>> {
        let state = self.state.read().await;
        Ok(state.products.iter().find(|p| p.id == product_id).cloned())
    }

    async fn list_product_colors(&self, product_id: i64) -> StoreResult<Vec<ProductColor>> {
        let state = self.state.read().await;
        Ok(state
            .product_colors
            .iter()
            .filter(|c| c.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
