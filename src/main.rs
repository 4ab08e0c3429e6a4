use std::io;
use std::sync::Arc;

use dotenvy::dotenv;
use storefront::config::AppConfig;
use storefront::infrastructure::order_repo::DieselOrderRepository;
use storefront::infrastructure::product_repo::DieselProductCatalog;
use storefront::infrastructure::stripe::StripeClient;
use storefront::state::AppState;
use storefront::{build_server, create_pool, run_migrations};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(io::Error::other)?;

    let pool = create_pool(&config.database_url).map_err(io::Error::other)?;
    run_migrations(&pool).map_err(io::Error::other)?;

    let payments = StripeClient::new(config.stripe.clone()).map_err(io::Error::other)?;
    let state = AppState::new(
        Arc::new(DieselOrderRepository::new(pool.clone())),
        Arc::new(DieselProductCatalog::new(pool)),
        Arc::new(payments),
        config.checkout_currency.clone(),
        config.public_base_url.clone(),
    );

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(state, &config.host, config.port)?.await
}
