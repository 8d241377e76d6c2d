//! Shared application state and HTTP router.

use std::sync::Arc;

use chrono::Duration;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{
    handlers, middleware, services::risk_scorer::RiskScorer, session::SessionStore,
    store::BankStore,
};

/// Everything a handler may need, injected through axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BankStore>,
    pub scorer: Arc<dyn RiskScorer>,
    pub sessions: SessionStore,

    /// Hex SHA-256 of the administrative key, if administration is enabled
    pub admin_key_hash: Option<String>,
}

impl AppState {
    pub fn new(store: Arc<dyn BankStore>, scorer: Arc<dyn RiskScorer>) -> Self {
        Self {
            store,
            scorer,
            sessions: SessionStore::new(),
            admin_key_hash: None,
        }
    }

    /// Replace the session store with one expiring sessions after `ttl` idle.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.sessions = SessionStore::with_ttl(ttl);
        self
    }

    pub fn with_admin_key_hash(mut self, hash: Option<String>) -> Self {
        self.admin_key_hash = hash.filter(|h| !h.trim().is_empty());
        self
    }
}

/// Build the HTTP router with routes and middleware.
pub fn router(state: AppState) -> Router {
    // Customer routes (session token required)
    let session_routes = Router::new()
        .route("/api/v1/logout", post(handlers::auth::logout))
        .route("/api/v1/dashboard", get(handlers::dashboard::dashboard))
        .route("/api/v1/profile", get(handlers::dashboard::profile))
        .route("/api/v1/accounts", get(handlers::accounts::list_accounts))
        .route(
            "/api/v1/transactions",
            get(handlers::transactions::list_transactions),
        )
        .route(
            "/api/v1/loans",
            get(handlers::loans::list_loans).post(handlers::loans::submit_loan),
        )
        .route(
            "/api/v1/loans/evaluations",
            get(handlers::loans::list_evaluations),
        )
        .route("/api/v1/loans/quote", post(handlers::loans::quote_loan))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::session_middleware,
        ));

    // Administrative routes (admin key required)
    let admin_routes = Router::new()
        .route(
            "/api/v1/admin/loans/pending-review",
            get(handlers::admin::pending_review),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::admin_middleware,
        ));

    Router::new()
        // Public routes
        .route("/health", get(handlers::health::health_check))
        .route("/api/v1/login", post(handlers::auth::login))
        .merge(session_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
