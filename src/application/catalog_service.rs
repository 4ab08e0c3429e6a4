use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::ProductCatalog;
use crate::domain::product::{Product, ProductFilter};

const MAX_LIMIT: i64 = 100;

#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn ProductCatalog>,
}

impl CatalogService {
    pub fn new(catalog: Arc<dyn ProductCatalog>) -> Self {
        Self { catalog }
    }

    pub async fn list_products(&self, mut filter: ProductFilter) -> Result<Vec<Product>, DomainError> {
        filter.limit = filter.limit.map(|l| l.clamp(1, MAX_LIMIT));
        self.catalog.list(filter).await
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product, DomainError> {
        self.catalog
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound)
    }
}
