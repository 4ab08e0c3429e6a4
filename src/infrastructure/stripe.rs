//! Stripe Checkout client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;

use crate::domain::errors::DomainError;
use crate::domain::payment::{
    CheckoutSession, CheckoutSessionRequest, PaymentLineItem, PaymentSession,
};
use crate::domain::ports::PaymentProvider;

/// Configuration for talking to the Stripe REST API.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// API root, e.g. `"https://api.stripe.com"`.
    pub api_base: String,

    /// Secret API key used as bearer token.
    pub secret_key: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

/// Errors that can occur when communicating with Stripe.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// An HTTP transport or deserialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe returned a non-2xx response.
    #[error("unexpected response from Stripe: {0}")]
    UnexpectedResponse(String),

    /// The configured API root is not an absolute http(s) URL.
    #[error("invalid Stripe API base '{0}'")]
    InvalidBaseUrl(String),
}

impl From<PaymentError> for DomainError {
    fn from(e: PaymentError) -> Self {
        DomainError::PaymentProvider(e.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct StripeClient {
    config: StripeConfig,
    base: Url,
    http: Client,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Result<Self, PaymentError> {
        let base = Url::parse(&config.api_base)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| PaymentError::InvalidBaseUrl(config.api_base.clone()))?;
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, base, http })
    }

    /// `<api_base>/v1/<segments>`, each segment percent-encoded on its own so
    /// caller-supplied ids cannot change the path.
    fn url(&self, segments: &[&str]) -> Result<Url, PaymentError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| PaymentError::InvalidBaseUrl(self.config.api_base.clone()))?
            .pop_if_empty()
            .push("v1")
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T, PaymentError> {
        let url = self.url(segments)?;
        let response = self
            .http
            .get(url.clone())
            .bearer_auth(&self.config.secret_key)
            .query(query)
            .send()
            .await?;

        read_json(response, url.path()).await
    }

    async fn fetch_session(&self, session_id: &str) -> Result<PaymentSession, PaymentError> {
        let session: SessionBody = self
            .get_json(&["checkout", "sessions", session_id], &[])
            .await?;
        let line_items: ListBody<LineItemBody> = self
            .get_json(
                &["checkout", "sessions", session_id, "line_items"],
                &[("expand[]", "data.price.product"), ("limit", "100")],
            )
            .await?;

        let customer = session.customer_details.unwrap_or_default();
        Ok(PaymentSession {
            id: session.id,
            payment_status: session.payment_status,
            amount_total: session.amount_total,
            customer_email: customer.email,
            customer_name: customer.name,
            line_items: line_items
                .data
                .into_iter()
                .map(|item| {
                    let price = item.price.unwrap_or_default();
                    PaymentLineItem {
                        product_name: price.product.and_then(|p| p.name).unwrap_or_default(),
                        quantity: item.quantity,
                        unit_amount: price.unit_amount,
                    }
                })
                .collect(),
        })
    }

    async fn open_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let response = self
            .http
            .post(self.url(&["checkout", "sessions"])?)
            .bearer_auth(&self.config.secret_key)
            .form(&checkout_form(&request))
            .send()
            .await?;

        let body: CreatedSessionBody = read_json(response, "checkout/sessions").await?;
        Ok(CheckoutSession {
            id: body.id,
            url: body.url,
        })
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn retrieve_session(&self, session_id: &str) -> Result<PaymentSession, DomainError> {
        Ok(self.fetch_session(session_id).await?)
    }

    async fn create_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSession, DomainError> {
        Ok(self.open_session(request).await?)
    }
}

async fn read_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
    path: &str,
) -> Result<T, PaymentError> {
    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        return Err(PaymentError::UnexpectedResponse(format!(
            "{path} failed with status {status}: {text}"
        )));
    }

    Ok(response.json().await?)
}

/// Flattens a checkout request into Stripe's bracketed form encoding.
fn checkout_form(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        ("payment_method_types[0]".to_string(), "card".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
    ];

    for (i, line) in request.lines.iter().enumerate() {
        let prefix = format!("line_items[{i}]");
        form.push((
            format!("{prefix}[price_data][currency]"),
            request.currency.clone(),
        ));
        form.push((
            format!("{prefix}[price_data][product_data][name]"),
            line.name.clone(),
        ));
        if let Some(image) = &line.image_url {
            form.push((
                format!("{prefix}[price_data][product_data][images][0]"),
                image.clone(),
            ));
        }
        form.push((
            format!("{prefix}[price_data][unit_amount]"),
            line.unit_amount.to_string(),
        ));
        form.push((format!("{prefix}[quantity]"), line.quantity.to_string()));
    }

    form
}

#[derive(Debug, Deserialize)]
struct SessionBody {
    id: String,
    payment_status: String,
    amount_total: Option<i64>,
    customer_details: Option<CustomerDetailsBody>,
}

#[derive(Debug, Default, Deserialize)]
struct CustomerDetailsBody {
    email: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListBody<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct LineItemBody {
    quantity: Option<i64>,
    price: Option<PriceBody>,
}

#[derive(Debug, Default, Deserialize)]
struct PriceBody {
    unit_amount: Option<i64>,
    product: Option<ProductBody>,
}

#[derive(Debug, Deserialize)]
struct ProductBody {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedSessionBody {
    id: String,
    url: Option<String>,
}
