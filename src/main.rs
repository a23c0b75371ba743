//! OpenSASE Checkout - storefront checkout service

use anyhow::Result;
use opensase_checkout::{api, client::HttpCommerceApi, config::Config, messaging::EventPublisher, store::{CheckoutStore, InMemoryCheckoutStore, PgCheckoutStore}};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = Config::from_env()?;

    let store: Arc<dyn CheckoutStore> = match &config.database_url {
        Some(url) => {
            let db = PgPoolOptions::new().max_connections(10).connect(url).await?;
            sqlx::migrate!("./migrations").run(&db).await?;
            Arc::new(PgCheckoutStore::new(db))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, checkout sessions are kept in memory");
            Arc::new(InMemoryCheckoutStore::new())
        }
    };
    let commerce = Arc::new(HttpCommerceApi::new(&config.commerce_api_url, config.commerce_api_token.clone(), config.commerce_api_timeout)?);
    let events = EventPublisher::connect(config.nats_url.as_deref()).await;

    let state = api::AppState::new(store, commerce, &config.shop, events);
    let app = api::router(state);

    tracing::info!("🚀 OpenSASE Checkout listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?, app).await?;
    Ok(())
}
