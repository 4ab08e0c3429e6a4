use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::product::{Product, ProductFilter, ProductStatus};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListProductsParams {
    /// DRAFT, PUBLISHED, ARCHIVED or `all`. Defaults to PUBLISHED.
    pub status: Option<String>,
    pub category: Option<String>,
    /// Maximum number of products, 1 to 100.
    pub limit: Option<i64>,
}

impl ListProductsParams {
    fn into_filter(self) -> Result<ProductFilter, AppError> {
        let status = match self.status.as_deref() {
            None => Some(ProductStatus::Published),
            Some(s) if s.eq_ignore_ascii_case("all") => None,
            Some(s) => Some(s.parse::<ProductStatus>()?),
        };
        Ok(ProductFilter {
            status,
            category: self.category,
            limit: self.limit,
        })
    }
}

/// Catalog entry as shown to shoppers. The download link is only handed out
/// through orders.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: String,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub status: String,
    pub created_at: String,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            slug: product.slug,
            description: product.description,
            price: product.price.to_string(),
            image_url: product.image_url,
            category: product.category,
            status: product.status.as_str().to_string(),
            created_at: product.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListProductsResponse {
    pub products: Vec<ProductResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductEnvelope {
    pub product: ProductResponse,
}

/// GET /products
#[utoipa::path(
    get,
    path = "/products",
    params(ListProductsParams),
    responses(
        (status = 200, description = "Products, newest first", body = ListProductsResponse),
        (status = 400, description = "Unknown status filter"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn list_products(
    state: web::Data<AppState>,
    query: web::Query<ListProductsParams>,
) -> Result<HttpResponse, AppError> {
    let filter = query.into_inner().into_filter()?;
    let products = state.catalog.list_products(filter).await?;

    Ok(HttpResponse::Ok().json(ListProductsResponse {
        products: products.into_iter().map(Into::into).collect(),
    }))
}

/// GET /products/{id}
#[utoipa::path(
    get,
    path = "/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product UUID"),
    ),
    responses(
        (status = 200, description = "Product found", body = ProductEnvelope),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn get_product(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let product = state.catalog.get_product(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ProductEnvelope {
        product: product.into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(status: Option<&str>) -> ListProductsParams {
        ListProductsParams {
            status: status.map(str::to_string),
            category: None,
            limit: None,
        }
    }

    #[test]
    fn missing_status_lists_published() {
        let filter = params(None).into_filter().expect("valid filter");
        assert_eq!(filter.status, Some(ProductStatus::Published));
    }

    #[test]
    fn all_disables_status_filter() {
        let filter = params(Some("ALL")).into_filter().expect("valid filter");
        assert_eq!(filter.status, None);
    }

    #[test]
    fn unknown_status_is_a_client_error() {
        let err = params(Some("hidden")).into_filter().unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
