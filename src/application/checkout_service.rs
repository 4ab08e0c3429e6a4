use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;

use crate::domain::errors::DomainError;
use crate::domain::payment::{to_minor_units, CheckoutLine, CheckoutSession, CheckoutSessionRequest};
use crate::domain::ports::PaymentProvider;

/// One cart line as submitted by the storefront client.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutItemInput {
    pub name: String,
    /// Decimal price as text, e.g. "9.99".
    pub price: String,
    pub quantity: i64,
    pub image_url: Option<String>,
}

#[derive(Clone)]
pub struct CheckoutService {
    payments: Arc<dyn PaymentProvider>,
    currency: String,
}

impl CheckoutService {
    pub fn new(payments: Arc<dyn PaymentProvider>, currency: impl Into<String>) -> Self {
        Self {
            payments,
            currency: currency.into(),
        }
    }

    /// Opens a hosted checkout session for `items`. The provider redirects to
    /// `<origin>/success?session_id=...` once paid and back to `<origin>/cart`
    /// when the shopper cancels.
    pub async fn create_session(
        &self,
        items: Vec<CheckoutItemInput>,
        origin: &str,
    ) -> Result<CheckoutSession, DomainError> {
        if items.is_empty() {
            return Err(DomainError::InvalidInput("cart is empty".to_string()));
        }

        let lines = items
            .into_iter()
            .map(to_checkout_line)
            .collect::<Result<Vec<_>, _>>()?;

        let origin = origin.trim_end_matches('/');
        let request = CheckoutSessionRequest {
            currency: self.currency.clone(),
            lines,
            success_url: format!("{origin}/success?session_id={{CHECKOUT_SESSION_ID}}"),
            cancel_url: format!("{origin}/cart"),
        };

        let session = self.payments.create_session(request).await?;
        log::info!("Opened checkout session {}", session.id);
        Ok(session)
    }
}

fn to_checkout_line(item: CheckoutItemInput) -> Result<CheckoutLine, DomainError> {
    if item.name.trim().is_empty() {
        return Err(DomainError::InvalidInput("item name is required".to_string()));
    }
    if item.quantity < 1 {
        return Err(DomainError::InvalidInput(format!(
            "quantity for '{}' must be at least 1",
            item.name
        )));
    }

    let price = BigDecimal::from_str(&item.price).map_err(|e| {
        DomainError::InvalidInput(format!("Invalid price '{}': {}", item.price, e))
    })?;
    // Bounded before any comparison or arithmetic on the parsed value.
    let unit_amount = to_minor_units(&price).ok_or_else(|| {
        DomainError::InvalidInput(format!("price for '{}' is out of range", item.name))
    })?;
    if unit_amount < 0 {
        return Err(DomainError::InvalidInput(format!(
            "price for '{}' must not be negative",
            item.name
        )));
    }

    Ok(CheckoutLine {
        name: item.name,
        unit_amount,
        quantity: item.quantity,
        image_url: item.image_url.filter(|url| !url.is_empty()),
    })
}
