use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use super::errors::DomainError;
use super::order::{Insertion, NewOrder, OrderView};
use super::payment::{CheckoutSession, CheckoutSessionRequest, PaymentSession};
use super::product::{NewProduct, Product, ProductFilter};

#[automock]
#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError>;

    async fn find_by_payment_id(&self, payment_id: &str)
        -> Result<Option<OrderView>, DomainError>;

    /// Inserts the order and its items atomically. When an order with the same
    /// payment id already exists nothing is written and the stored order is
    /// returned instead.
    async fn insert(&self, order: NewOrder) -> Result<Insertion, DomainError>;
}

#[automock]
#[async_trait]
pub trait ProductCatalog: Send + Sync + 'static {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError>;

    /// Oldest product carrying exactly this display name.
    async fn find_by_name(&self, name: &str) -> Result<Option<Product>, DomainError>;

    async fn list(&self, filter: ProductFilter) -> Result<Vec<Product>, DomainError>;

    async fn create(&self, product: NewProduct) -> Result<Product, DomainError>;
}

#[automock]
#[async_trait]
pub trait PaymentProvider: Send + Sync + 'static {
    /// Fetches the session together with its line items.
    async fn retrieve_session(&self, session_id: &str) -> Result<PaymentSession, DomainError>;

    async fn create_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSession, DomainError>;
}
