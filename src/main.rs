//! Visitor Log Server
//!
//! REST and server-sent-event API over the live visitor log.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use visitor_log::{
    api,
    config::{AppConfig, LoggingConfig},
    repository::Repository,
    services::Services,
    store::memory::MemoryStore,
    AppState,
};

fn init_logging(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("visitor_log={},tower_http=debug", config.level))
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => subscriber
            .with(fmt::layer().json().with_current_span(true).with_target(true))
            .init(),
        _ => subscriber.with(fmt::layer().pretty().with_target(true)).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logging(&config.logging);

    tracing::info!("Starting Visitor Log v{}", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(MemoryStore::from_config(&config.store));
    tracing::info!(
        collection = %config.store.collection,
        enforce_indexes = config.store.enforce_indexes,
        "Document store ready"
    );

    let addr = SocketAddr::new(
        config
            .server
            .host
            .parse()
            .context("Invalid host address")?,
        config.server.port,
    );

    let repository = Repository::new(store, &config.store.collection);
    let services = Services::new(repository);

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    let app = api::create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
