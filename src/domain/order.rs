use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Failed => "FAILED",
            OrderStatus::Refunded => "REFUNDED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "PAID" => Ok(OrderStatus::Paid),
            "FAILED" => Ok(OrderStatus::Failed),
            "REFUNDED" => Ok(OrderStatus::Refunded),
            other => Err(DomainError::Internal(format!("unknown order status '{other}'"))),
        }
    }
}

/// A resolved line ready to be persisted with its order.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub quantity: i32,
    /// Unit price charged by the payment provider, not the current catalog price.
    pub price: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    /// Assigned before insert so the order number can be derived from it.
    pub id: Uuid,
    pub order_number: String,
    pub status: OrderStatus,
    pub total_amount: BigDecimal,
    pub stripe_payment_id: String,
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItemView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub download_url: Option<String>,
    pub quantity: i32,
    pub price: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderView {
    pub id: Uuid,
    pub order_number: String,
    pub status: OrderStatus,
    pub total_amount: BigDecimal,
    pub stripe_payment_id: String,
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
}

/// Result of persisting an order keyed by its payment id.
#[derive(Debug, Clone, PartialEq)]
pub enum Insertion {
    Created(OrderView),
    AlreadyExists(OrderView),
}

/// Human-facing order number, e.g. `ORD-20250301-3F2A9C1B`.
pub fn generate_order_number(now: DateTime<Utc>, id: Uuid) -> String {
    let suffix: String = id
        .simple()
        .to_string()
        .chars()
        .take(8)
        .collect::<String>()
        .to_uppercase();
    format!("ORD-{}-{}", now.format("%Y%m%d"), suffix)
}
