//! JSON bodies shared by the HTTP handlers and the storefront client.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::order::{OrderItemView, OrderView};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileOrderRequest {
    /// Checkout session id from the payment provider's success redirect.
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub download_url: Option<String>,
    pub quantity: i32,
    /// Unit price charged, as a decimal string, e.g. "9.99"
    pub price: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub status: String,
    pub total_amount: String,
    pub stripe_payment_id: String,
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub created_at: String,
    pub order_items: Vec<OrderItemResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderEnvelope {
    pub order: OrderResponse,
}

impl From<OrderItemView> for OrderItemResponse {
    fn from(item: OrderItemView) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            product_name: item.product_name,
            download_url: item.download_url,
            quantity: item.quantity,
            price: item.price.to_string(),
        }
    }
}

impl From<OrderView> for OrderResponse {
    fn from(order: OrderView) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number,
            status: order.status.to_string(),
            total_amount: order.total_amount.to_string(),
            stripe_payment_id: order.stripe_payment_id,
            customer_email: order.customer_email,
            customer_name: order.customer_name,
            created_at: order.created_at.to_rfc3339(),
            order_items: order.items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionResponse {
    pub session_id: String,
    /// Hosted payment page to redirect the shopper to.
    pub url: Option<String>,
}
