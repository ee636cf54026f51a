mod auth;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod planner;
mod routes;
mod state;
mod trips;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::token::TokenKeys;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::planner::service::ItineraryService;
use crate::routes::build_router;
use crate::state::AppState;
use crate::trips::store::{PgTripStore, TripStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Itinera API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize LLM client
    let llm = LlmClient::new(config.llm.clone())?;
    info!(
        "LLM client initialized (model: {}, normalize mode: {:?})",
        llm.model(),
        config.normalize_mode
    );

    let trips: Arc<dyn TripStore> = Arc::new(PgTripStore::new(db.clone()));
    let planner = ItineraryService::new(trips.clone(), Arc::new(llm), config.normalize_mode);

    // Build app state
    let state = AppState {
        db,
        tokens: TokenKeys::new(&config.jwt_secret, config.token_ttl_hours),
        trips,
        planner,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
