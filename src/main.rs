//! Coachdesk billing service entry point.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use coachdesk::adapters::http::billing::{billing_router, BillingAppState};
use coachdesk::adapters::postgres::PostgresLedgerStore;
use coachdesk::config::AppConfig;
use coachdesk::domain::foundation::SystemClock;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("migrations applied");
    }

    let state = BillingAppState::new(
        Arc::new(PostgresLedgerStore::new(pool)),
        Arc::new(SystemClock),
        config.payment.plan_catalog(),
        config.payment.webhook_secret(),
    );

    let app = axum::Router::new()
        .nest("/api", billing_router())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::timeout::TimeoutLayer::new(
            std::time::Duration::from_secs(config.server.request_timeout_secs),
        ))
        .layer(cors_layer(&config))
        .with_state(state);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "coachdesk billing service listening");

    axum::serve(listener, app).await?;
    Ok(())
}

fn cors_layer(config: &AppConfig) -> tower_http::cors::CorsLayer {
    let mut cors = tower_http::cors::CorsLayer::new();
    for origin in config.server.cors_origins_list() {
        if let Ok(value) = origin.parse::<http::HeaderValue>() {
            cors = cors.allow_origin(value);
        }
    }
    cors
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "coachdesk=debug,tower_http=info".into());

    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
