pub mod application;
pub mod cart;
pub mod config;
pub mod db;
pub mod domain;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;
pub mod state;

use actix_web::{error::JsonPayloadError, middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use db::{create_pool, DbPool};

use crate::domain::errors::DomainError;
use crate::errors::AppError;
use crate::state::AppState;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), DomainError> {
    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| DomainError::Internal(format!("migrations failed: {e}")))?;
    Ok(())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::orders::reconcile_order,
        handlers::orders::get_order,
        handlers::checkout::create_checkout_session,
        handlers::products::list_products,
        handlers::products::get_product,
    ),
    components(schemas(
        dto::ReconcileOrderRequest,
        dto::OrderItemResponse,
        dto::OrderResponse,
        dto::OrderEnvelope,
        handlers::checkout::CheckoutItemRequest,
        handlers::checkout::CreateCheckoutSessionRequest,
        dto::CheckoutSessionResponse,
        handlers::products::ProductResponse,
        handlers::products::ListProductsResponse,
        handlers::products::ProductEnvelope,
    )),
    tags(
        (name = "orders", description = "Order reconciliation and retrieval"),
        (name = "checkout", description = "Payment provider checkout sessions"),
        (name = "products", description = "Published catalog"),
    )
)]
pub struct ApiDoc;

fn json_error(err: JsonPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    AppError::InvalidInput(err.to_string()).into()
}

/// Routes and extractor config, shared by the server and the handler tests.
/// Expects `web::Data<AppState>` to be registered by the caller.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .service(
            web::scope("/orders")
                .route("", web::post().to(handlers::orders::reconcile_order))
                .route("/{id}", web::get().to(handlers::orders::get_order)),
        )
        .route(
            "/checkout-sessions",
            web::post().to(handlers::checkout::create_checkout_session),
        )
        .service(
            web::scope("/products")
                .route("", web::get().to(handlers::products::list_products))
                .route("/{id}", web::get().to(handlers::products::get_product)),
        )
        .service(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(state);
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(configure)
    })
    .bind((host.to_string(), port))?
    .run())
}
