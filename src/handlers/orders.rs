use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::application::order_service::Reconciled;
use crate::dto::{OrderEnvelope, ReconcileOrderRequest};
use crate::errors::AppError;
use crate::state::AppState;

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Reconciles a completed checkout session into an order. Repeating the call
/// with the same session id returns the order created the first time.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = ReconcileOrderRequest,
    responses(
        (status = 201, description = "Order created from a paid session", body = OrderEnvelope),
        (status = 200, description = "Session already reconciled", body = OrderEnvelope),
        (status = 400, description = "Payment not completed or invalid request"),
        (status = 500, description = "Product resolution or internal failure"),
    ),
    tag = "orders"
)]
pub async fn reconcile_order(
    state: web::Data<AppState>,
    body: web::Json<ReconcileOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let response = match state.orders.reconcile(&body.session_id).await? {
        Reconciled::Created(order) => HttpResponse::Created().json(OrderEnvelope {
            order: order.into(),
        }),
        Reconciled::Existing(order) => HttpResponse::Ok().json(OrderEnvelope {
            order: order.into(),
        }),
    };
    Ok(response)
}

/// GET /orders/{id}
///
/// Returns the order together with its items and download links.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderEnvelope),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    match state.orders.get_order(order_id).await? {
        Some(order) => Ok(HttpResponse::Ok().json(OrderEnvelope {
            order: order.into(),
        })),
        None => Err(AppError::NotFound),
    }
}
