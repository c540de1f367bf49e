//! # Server Setup
//!
//! Server initialization, route registration, and HTTP server startup.
//!
//! This module provides the main server setup function that creates the Axum
//! router, registers all routes, applies middleware, and starts the HTTP
//! server.

// region: --- Imports
use crate::chat::{ChatRoom, GenerationClient};
use crate::handlers;
use crate::middleware::{log_requests, require_auth, stamp_req};
use axum::{
    routing::{get, post},
    Router,
};
use lib_core::config::{core_config, init_config};
use lib_core::{create_pool, Config, DbPool};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
// endregion: --- Imports

// region: --- AppState
/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub room: Arc<ChatRoom>,
    pub generation: Arc<GenerationClient>,
}

impl axum::extract::FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl axum::extract::FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<ChatRoom> {
    fn from_ref(state: &AppState) -> Self {
        state.room.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<GenerationClient> {
    fn from_ref(state: &AppState) -> Self {
        state.generation.clone()
    }
}
// endregion: --- AppState

// region: --- Server Configuration
/// Server configuration
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:5000")
    pub bind_address: String,
    /// Allowed CORS origins
    pub allowed_origins: Vec<String>,
    /// Database migrations path
    pub migrations_path: &'static str,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5000".to_string(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            migrations_path: "./migrations",
        }
    }
}
// endregion: --- Server Configuration

// region: --- Server Setup
/// Initialize and start the HTTP server
///
/// # Errors
///
/// This function will return an error if:
/// - Configuration loading or validation fails
/// - Database connection or migrations fail
/// - Server binding fails
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let log_level = std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase();

    let filter = match log_level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {
            tracing_subscriber::EnvFilter::new(log_level.clone())
        }
        _ => tracing_subscriber::EnvFilter::new("info"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global tracing subscriber");

    info!("HUDDLE CHAT BACKEND STARTING");
    info!("Log level: {}", log_level);

    dotenvy::dotenv().ok();

    info!("Loading configuration...");
    init_config().map_err(|e| anyhow::anyhow!(e))?;
    let app_config = core_config().clone();

    info!("Database URL: {}", app_config.database_url);

    // Ensure data directory exists for SQLite database
    if app_config.database_url.starts_with("sqlite:") {
        let db_path = app_config.database_url.trim_start_matches("sqlite:");
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
                info!("Created database directory: {:?}", parent);
            }
        }
    }

    info!("Connecting to database...");
    let pool = create_pool().await?;

    info!("Running database migrations from: {}", config.migrations_path);
    let migrator =
        sqlx::migrate::Migrator::new(std::path::Path::new(config.migrations_path)).await?;
    migrator.run(&pool).await?;
    info!("Migrations complete");

    // Room state: presence starts at zero on every process start
    let room = Arc::new(ChatRoom::new(pool.clone()));

    let generation = Arc::new(GenerationClient::new(
        app_config.ollama_url.clone(),
        app_config.ollama_model.clone(),
    ));
    info!(
        "Generation backend: {} (model {})",
        app_config.ollama_url, app_config.ollama_model
    );

    let state = AppState {
        db: pool,
        config: app_config,
        room,
        generation,
    };

    let app = create_router(state, config.allowed_origins.clone());

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;

    info!("SERVER READY: http://{}", config.bind_address);
    log_server_info();

    axum::serve(listener, app).await?;
    Ok(())
}

/// Create the main application router with all routes
fn create_router(state: AppState, allowed_origins: Vec<String>) -> Router {
    use axum::http::{HeaderValue, Method};

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ]);

    info!("[ROUTE SETUP] Registering HTTP routes...");
    Router::new()
        .route("/api/auth/signup", post(handlers::auth::signup))
        .route("/api/auth/login", post(handlers::auth::login))
        .route(
            "/api/upload",
            post(handlers::upload::upload_file)
                .route_layer(axum::middleware::from_fn(require_auth)),
        )
        .route("/api/ws/chat", get(handlers::websocket::chat_websocket))
        .route("/health", get(|| async { "OK" }))
        .fallback(|| async {
            (axum::http::StatusCode::NOT_FOUND, "Route not found")
        })
        .with_state(state)
        // Request stamping (adds request ID) - must be first
        .layer(axum::middleware::from_fn(stamp_req))
        // Request/response logging
        .layer(axum::middleware::from_fn(log_requests))
        // Tower HTTP trace layer for spans
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(cors)
}

/// Log server information
fn log_server_info() {
    info!("AUTH:");
    info!("   • POST /api/auth/signup");
    info!("   • POST /api/auth/login");
    info!("CHAT:");
    info!("   • GET  /api/ws/chat?token={{jwt}}");
    info!("UPLOAD:");
    info!("   • POST /api/upload (multipart, Bearer token)");
    info!("HEALTH:");
    info!("   • GET  /health");
}
// endregion: --- Server Setup
