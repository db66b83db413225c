//! Event Check-in Backend
//!
//! REST backend for attendee check-in: QR scan resolution, transactional
//! attendance updates and live roster feeds, persisted in SQLite.

mod api;
mod auth;
mod config;
mod db;
mod engine;
mod errors;
mod events;
mod models;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use engine::CheckInEngine;
use events::ChangeFeed;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub engine: Arc<CheckInEngine<Repository>>,
    pub feed: ChangeFeed,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, config: Config) -> Self {
        let feed = ChangeFeed::default();
        let engine = Arc::new(CheckInEngine::new(
            repo.clone(),
            feed.clone(),
            config.ticket_prefix.clone(),
        ));
        Self {
            repo,
            engine,
            feed,
            config: Arc::new(config),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Event Check-in Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Ticket prefix: {:?}", config.ticket_prefix);

    // Warn if PSK is not configured
    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (CHECKIN_API_PSK). Authentication is disabled!");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    let bind_addr = config.bind_addr;
    let state = AppState::new(repo, config);

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    // API routes
    let api_routes = Router::new()
        .route("/revision", get(api::get_revision))
        // Team documents
        .route("/teams", get(api::list_teams).post(api::create_team))
        .route("/teams/{id}", get(api::get_team).delete(api::delete_team))
        .route("/teams/{id}/attendance", put(api::update_attendance))
        // Scanner
        .route("/scan", post(api::scan_code))
        .route("/checkin", post(api::check_in))
        // Rosters
        .route("/attendees", get(api::list_attendees))
        .route("/attendance", get(api::list_attendance))
        .route("/events", get(api::roster_events))
        // Second source and registration lookup
        .route("/candidates", get(api::list_candidates).post(api::create_candidate))
        .route("/registrations", get(api::find_registration))
        .route("/registrations/{source}/{id}", put(api::update_registration))
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
