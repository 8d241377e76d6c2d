//! Andean Bank - Main Application Entry Point
//!
//! REST API server for customer online banking: login, accounts, transaction
//! history and loan applications with automated credit-risk decisions.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Authentication**: Customer credentials with SHA-256 digests, bearer sessions
//! - **Risk model**: JSON linear classifier, with a fixed fallback label
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create a lazy database connection pool
//! 3. Run database migrations (failures are logged, not fatal)
//! 4. Load the risk model
//! 5. Build HTTP router with routes and middleware
//! 6. Start server on configured port

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use andean_bank::{
    app::{self, AppState},
    config, db,
    services::risk_scorer,
    session,
    store::postgres::PgStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = config::Config::from_env()?;
    let database_url = config.database_url()?;
    tracing::info!(
        database = %config.redacted_database_target(),
        "Configuration loaded"
    );

    // Create database pool; no connection is attempted yet
    let pool = db::create_pool(&database_url, config.db_max_connections)?;
    tracing::info!("Database pool created");

    if config.run_migrations {
        match db::run_migrations(&pool).await {
            Ok(()) => tracing::info!("Database migrations complete"),
            Err(e) => tracing::error!(error = %e, "Database migrations failed; continuing without them"),
        }
    }

    let scorer = risk_scorer::load_scorer(config.risk_model_path.as_deref());

    let state = AppState::new(Arc::new(PgStore::new(pool)), scorer)
        .with_admin_key_hash(config.admin_key_hash.clone())
        .with_session_ttl(session::ttl_from_secs(config.session_ttl_secs));
    if state.admin_key_hash.is_none() {
        tracing::warn!("ADMIN_KEY_HASH not set; administrative routes are disabled");
    }

    let app = app::router(state);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // This blocks forever, handling requests concurrently with tokio
    axum::serve(listener, app).await?;

    Ok(())
}
