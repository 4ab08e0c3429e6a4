use std::sync::Arc;

use crate::application::catalog_service::CatalogService;
use crate::application::checkout_service::CheckoutService;
use crate::application::order_service::OrderService;
use crate::domain::ports::{OrderRepository, PaymentProvider, ProductCatalog};

/// Services shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub orders: OrderService,
    pub checkout: CheckoutService,
    pub catalog: CatalogService,
    /// Redirect origin used when a checkout request carries no `Origin` header.
    pub public_base_url: String,
}

impl AppState {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        catalog: Arc<dyn ProductCatalog>,
        payments: Arc<dyn PaymentProvider>,
        currency: impl Into<String>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            orders: OrderService::new(orders, catalog.clone(), payments.clone()),
            checkout: CheckoutService::new(payments, currency),
            catalog: CatalogService::new(catalog),
            public_base_url: public_base_url.into(),
        }
    }
}
