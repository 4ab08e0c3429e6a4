//! Client side of checkout: hands the cart to the storefront API and clears
//! it once the resulting payment has been reconciled into an order.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use mockall::automock;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::state::CartItem;
use super::store::CartStore;
use crate::dto::{CheckoutSessionResponse, OrderEnvelope, OrderResponse, ReconcileOrderRequest};

/// Cart line as submitted to `POST /checkout-sessions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub name: String,
    pub price: BigDecimal,
    pub quantity: u32,
    pub image_url: Option<String>,
}

impl From<&CartItem> for CheckoutItem {
    fn from(item: &CartItem) -> Self {
        Self {
            name: item.name.clone(),
            price: item.price.clone(),
            quantity: item.quantity,
            image_url: item.image_url.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storefront rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

#[automock]
#[async_trait]
pub trait StorefrontApi: Send + Sync {
    /// Returns the provider session id to redirect the shopper to.
    async fn create_checkout_session(&self, items: Vec<CheckoutItem>)
        -> Result<String, CheckoutError>;

    async fn confirm_order(&self, session_id: &str) -> Result<OrderResponse, CheckoutError>;
}

/// Starts checkout for the current cart contents. The cart is left untouched.
pub async fn begin_checkout<A>(store: &CartStore, api: &A) -> Result<String, CheckoutError>
where
    A: StorefrontApi + ?Sized,
{
    if store.state().is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    api.create_checkout_session(store.state().checkout_items())
        .await
}

/// Reconciles the paid session and clears the cart. On failure the cart keeps
/// its items so the shopper can retry.
pub async fn complete_checkout<A>(
    store: &mut CartStore,
    api: &A,
    session_id: &str,
) -> Result<OrderResponse, CheckoutError>
where
    A: StorefrontApi + ?Sized,
{
    let order = api.confirm_order(session_id).await?;
    store.clear();
    log::info!("Checkout completed as order {}", order.order_number);
    Ok(order)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutRequestBody {
    items: Vec<CheckoutItem>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// `StorefrontApi` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStorefrontClient {
    base_url: String,
    http: Client,
}

impl HttpStorefrontClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    async fn rejected(response: reqwest::Response) -> CheckoutError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);
        CheckoutError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl StorefrontApi for HttpStorefrontClient {
    async fn create_checkout_session(
        &self,
        items: Vec<CheckoutItem>,
    ) -> Result<String, CheckoutError> {
        let response = self
            .http
            .post(format!("{}/checkout-sessions", self.base_url))
            .json(&CheckoutRequestBody { items })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }
        let body: CheckoutSessionResponse = response.json().await?;
        Ok(body.session_id)
    }

    async fn confirm_order(&self, session_id: &str) -> Result<OrderResponse, CheckoutError> {
        let response = self
            .http
            .post(format!("{}/orders", self.base_url))
            .json(&ReconcileOrderRequest {
                session_id: session_id.to_string(),
            })
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                let body: OrderEnvelope = response.json().await?;
                Ok(body.order)
            }
            _ => Err(Self::rejected(response).await),
        }
    }
}
