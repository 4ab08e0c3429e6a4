use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::application::checkout_service::CheckoutItemInput;
use crate::dto::CheckoutSessionResponse;
use crate::errors::AppError;
use crate::state::AppState;

/// Prices arrive either as decimal strings (preferred) or as JSON numbers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DecimalInput {
    Text(String),
    Number(serde_json::Number),
}

impl DecimalInput {
    fn into_text(self) -> String {
        match self {
            DecimalInput::Text(text) => text,
            DecimalInput::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItemRequest {
    pub name: String,
    /// Decimal unit price, e.g. "9.99"
    #[schema(value_type = String)]
    pub price: DecimalInput,
    pub quantity: i64,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCheckoutSessionRequest {
    pub items: Vec<CheckoutItemRequest>,
}

/// POST /checkout-sessions
///
/// Opens a hosted checkout session for the submitted cart lines.
#[utoipa::path(
    post,
    path = "/checkout-sessions",
    request_body = CreateCheckoutSessionRequest,
    responses(
        (status = 200, description = "Checkout session opened", body = CheckoutSessionResponse),
        (status = 400, description = "Empty cart or invalid line"),
        (status = 500, description = "Payment provider or internal failure"),
    ),
    tag = "checkout"
)]
pub async fn create_checkout_session(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateCheckoutSessionRequest>,
) -> Result<HttpResponse, AppError> {
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty() && *value != "null")
        .unwrap_or(state.public_base_url.as_str())
        .to_string();

    let items = body
        .into_inner()
        .items
        .into_iter()
        .map(|item| CheckoutItemInput {
            name: item.name,
            price: item.price.into_text(),
            quantity: item.quantity,
            image_url: item.image_url,
        })
        .collect();

    let session = state.checkout.create_session(items, &origin).await?;

    Ok(HttpResponse::Ok().json(CheckoutSessionResponse {
        session_id: session.id,
        url: session.url,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use actix_web::{http::StatusCode, test, App};

    use super::*;
    use crate::domain::payment::CheckoutSession;
    use crate::domain::ports::{MockOrderRepository, MockPaymentProvider, MockProductCatalog};

    fn state(payments: MockPaymentProvider) -> web::Data<AppState> {
        web::Data::new(AppState::new(
            Arc::new(MockOrderRepository::new()),
            Arc::new(MockProductCatalog::new()),
            Arc::new(payments),
            "eur",
            "http://localhost:3000",
        ))
    }

    #[actix_web::test]
    async fn opens_session_using_request_origin() {
        let cancel_url = Arc::new(Mutex::new(String::new()));
        let sink = cancel_url.clone();
        let mut payments = MockPaymentProvider::new();
        payments.expect_create_session().times(1).returning(move |request| {
            *sink.lock().unwrap() = request.cancel_url.clone();
            assert_eq!(request.lines[0].unit_amount, 1999);
            Ok(CheckoutSession {
                id: "cs_test_new".to_string(),
                url: Some("https://checkout.example.com/pay".to_string()),
            })
        });

        let app =
            test::init_service(App::new().app_data(state(payments)).configure(crate::configure))
                .await;

        let req = test::TestRequest::post()
            .uri("/checkout-sessions")
            .insert_header((header::ORIGIN, "https://shop.example.com"))
            .set_json(serde_json::json!({
                "items": [{ "name": "Icon Pack", "price": 19.99, "quantity": 1, "imageUrl": null }]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: CheckoutSessionResponse = test::read_body_json(resp).await;
        assert_eq!(body.session_id, "cs_test_new");
        assert_eq!(*cancel_url.lock().unwrap(), "https://shop.example.com/cart");
    }

    #[actix_web::test]
    async fn falls_back_to_public_base_url_without_origin() {
        let mut payments = MockPaymentProvider::new();
        payments
            .expect_create_session()
            .withf(|request| request.cancel_url == "http://localhost:3000/cart")
            .times(1)
            .returning(|_| {
                Ok(CheckoutSession {
                    id: "cs_test_new".to_string(),
                    url: None,
                })
            });

        let app =
            test::init_service(App::new().app_data(state(payments)).configure(crate::configure))
                .await;

        let req = test::TestRequest::post()
            .uri("/checkout-sessions")
            .set_json(serde_json::json!({
                "items": [{ "name": "Fonts", "price": "5.00", "quantity": 2 }]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn empty_cart_returns_400() {
        let app = test::init_service(
            App::new()
                .app_data(state(MockPaymentProvider::new()))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/checkout-sessions")
            .set_json(serde_json::json!({ "items": [] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
