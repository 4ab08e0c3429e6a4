use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductStatus {
    Draft,
    Published,
    Archived,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Draft => "DRAFT",
            ProductStatus::Published => "PUBLISHED",
            ProductStatus::Archived => "ARCHIVED",
        }
    }
}

impl FromStr for ProductStatus {
    type Err = DomainError;

    /// Case-insensitive, so query strings like `?status=published` work.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DRAFT" => Ok(ProductStatus::Draft),
            "PUBLISHED" => Ok(ProductStatus::Published),
            "ARCHIVED" => Ok(ProductStatus::Archived),
            _ => Err(DomainError::InvalidInput(format!("unknown product status '{s}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub image_url: Option<String>,
    pub download_url: Option<String>,
    pub category: Option<String>,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub image_url: Option<String>,
    pub download_url: Option<String>,
    pub category: Option<String>,
    pub status: ProductStatus,
}

/// Catalog listing filter. `status: None` lists every status.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFilter {
    pub status: Option<ProductStatus>,
    pub category: Option<String>,
    pub limit: Option<i64>,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            status: Some(ProductStatus::Published),
            category: None,
            limit: None,
        }
    }
}

/// Lowercases `name` and collapses every run of non-alphanumeric characters
/// into a single `-`, trimming dashes at both ends.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}
