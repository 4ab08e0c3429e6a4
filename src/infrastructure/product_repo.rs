use async_trait::async_trait;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::{run_blocking, DbPool};
use crate::domain::errors::DomainError;
use crate::domain::ports::ProductCatalog;
use crate::domain::product::{slugify, NewProduct, Product, ProductFilter};
use crate::schema::products;

use super::models::{NewProductRow, ProductRow};

pub struct DieselProductCatalog {
    pool: DbPool,
}

impl DieselProductCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = DomainError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Product {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            price: row.price,
            image_url: row.image_url,
            download_url: row.download_url,
            category: row.category,
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl ProductCatalog for DieselProductCatalog {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        run_blocking(&self.pool, move |conn| {
            products::table
                .find(id)
                .select(ProductRow::as_select())
                .first(conn)
                .optional()?
                .map(Product::try_from)
                .transpose()
        })
        .await
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Product>, DomainError> {
        let name = name.to_string();
        run_blocking(&self.pool, move |conn| {
            let mut matches = products::table
                .filter(products::name.eq(&name))
                .order(products::created_at.asc())
                .select(ProductRow::as_select())
                .limit(2)
                .load(conn)?;

            if matches.len() > 1 {
                log::warn!(
                    "Several catalog products are named '{}', resolving to the oldest",
                    name
                );
            }
            matches.truncate(1);
            matches.pop().map(Product::try_from).transpose()
        })
        .await
    }

    async fn list(&self, filter: ProductFilter) -> Result<Vec<Product>, DomainError> {
        run_blocking(&self.pool, move |conn| {
            let mut query = products::table
                .select(ProductRow::as_select())
                .order(products::created_at.desc())
                .into_boxed();

            if let Some(status) = filter.status {
                query = query.filter(products::status.eq(status.as_str()));
            }
            if let Some(category) = filter.category {
                query = query.filter(products::category.eq(category));
            }
            if let Some(limit) = filter.limit {
                query = query.limit(limit);
            }

            query
                .load(conn)?
                .into_iter()
                .map(Product::try_from)
                .collect()
        })
        .await
    }

    async fn create(&self, product: NewProduct) -> Result<Product, DomainError> {
        let slug = slugify(&product.name);
        if slug.is_empty() {
            return Err(DomainError::InvalidInput(format!(
                "product name '{}' has no usable characters",
                product.name
            )));
        }

        run_blocking(&self.pool, move |conn| {
            let row = diesel::insert_into(products::table)
                .values(&NewProductRow {
                    id: Uuid::new_v4(),
                    name: product.name,
                    slug,
                    description: product.description,
                    price: product.price,
                    image_url: product.image_url,
                    download_url: product.download_url,
                    category: product.category,
                    status: product.status.as_str().to_string(),
                })
                .returning(ProductRow::as_returning())
                .get_result(conn)?;

            Product::try_from(row)
        })
        .await
    }
}
