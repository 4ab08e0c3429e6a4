use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{
    generate_order_number, Insertion, NewOrder, NewOrderItem, OrderStatus, OrderView,
};
use crate::domain::payment::{from_minor_units, PaymentSession};
use crate::domain::ports::{OrderRepository, PaymentProvider, ProductCatalog};

const UNKNOWN_CUSTOMER_EMAIL: &str = "unknown@example.com";
const UNKNOWN_PRODUCT_NAME: &str = "Unknown Product";

/// How a reconciliation call was satisfied.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciled {
    Created(OrderView),
    Existing(OrderView),
}

impl Reconciled {
    pub fn order(&self) -> &OrderView {
        match self {
            Reconciled::Created(order) | Reconciled::Existing(order) => order,
        }
    }

    pub fn into_order(self) -> OrderView {
        match self {
            Reconciled::Created(order) | Reconciled::Existing(order) => order,
        }
    }
}

#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    catalog: Arc<dyn ProductCatalog>,
    payments: Arc<dyn PaymentProvider>,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        catalog: Arc<dyn ProductCatalog>,
        payments: Arc<dyn PaymentProvider>,
    ) -> Self {
        Self {
            orders,
            catalog,
            payments,
        }
    }

    /// Turns a completed payment session into exactly one paid order.
    ///
    /// Safe to call repeatedly with the same session id: later calls return the
    /// order created by the first one without contacting the payment provider.
    pub async fn reconcile(&self, session_id: &str) -> Result<Reconciled, DomainError> {
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(DomainError::InvalidInput("sessionId is required".to_string()));
        }
        // Provider ids are `cs_...` tokens; anything else never reaches the provider.
        if !session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(DomainError::InvalidInput(format!(
                "sessionId '{session_id}' is malformed"
            )));
        }

        if let Some(existing) = self.orders.find_by_payment_id(session_id).await? {
            log::debug!(
                "Session {} already reconciled as order {}",
                session_id,
                existing.order_number
            );
            return Ok(Reconciled::Existing(existing));
        }

        let session = self.payments.retrieve_session(session_id).await?;
        if !session.is_paid() {
            log::info!(
                "Session {} not paid (status {}), no order created",
                session_id,
                session.payment_status
            );
            return Err(DomainError::PaymentNotCompleted {
                status: session.payment_status,
            });
        }

        let items = self.resolve_items(&session).await?;
        let order = build_order(session_id, &session, items);

        match self.orders.insert(order).await? {
            Insertion::Created(order) => {
                log::info!(
                    "Created order {} for session {} ({} items, total {})",
                    order.order_number,
                    session_id,
                    order.items.len(),
                    order.total_amount
                );
                Ok(Reconciled::Created(order))
            }
            Insertion::AlreadyExists(order) => {
                log::info!(
                    "Session {} was reconciled concurrently as order {}",
                    session_id,
                    order.order_number
                );
                Ok(Reconciled::Existing(order))
            }
        }
    }

    pub async fn get_order(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        self.orders.find_by_id(id).await
    }

    async fn resolve_items(
        &self,
        session: &PaymentSession,
    ) -> Result<Vec<NewOrderItem>, DomainError> {
        let mut items = Vec::with_capacity(session.line_items.len());
        for line in &session.line_items {
            let name = if line.product_name.is_empty() {
                UNKNOWN_PRODUCT_NAME
            } else {
                line.product_name.as_str()
            };

            let Some(product) = self.catalog.find_by_name(name).await? else {
                log::error!(
                    "Session {} references product '{}' missing from the catalog",
                    session.id,
                    name
                );
                return Err(DomainError::ProductResolution {
                    product_name: name.to_string(),
                });
            };

            let quantity = line
                .quantity
                .filter(|q| *q > 0)
                .and_then(|q| i32::try_from(q).ok())
                .unwrap_or(1);

            items.push(NewOrderItem {
                product_id: product.id,
                quantity,
                price: from_minor_units(line.unit_amount.unwrap_or(0)),
            });
        }
        Ok(items)
    }
}

fn build_order(session_id: &str, session: &PaymentSession, items: Vec<NewOrderItem>) -> NewOrder {
    let customer_email = session
        .customer_email
        .clone()
        .filter(|email| !email.is_empty())
        .unwrap_or_else(|| UNKNOWN_CUSTOMER_EMAIL.to_string());

    let id = Uuid::new_v4();
    NewOrder {
        id,
        order_number: generate_order_number(Utc::now(), id),
        status: OrderStatus::Paid,
        total_amount: from_minor_units(session.amount_total.unwrap_or(0)),
        stripe_payment_id: session_id.to_string(),
        customer_email,
        customer_name: session.customer_name.clone(),
        items,
    }
}
