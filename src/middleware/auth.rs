//! Bearer-token authentication middleware.
//!
//! Two guards protect the API:
//! 1. `session_middleware`: resolves a customer session token opened at login
//!    and injects a [`SessionContext`] into the request
//! 2. `admin_middleware`: hashes the presented key with SHA-256 and compares it
//!    with the configured `ADMIN_KEY_HASH`
//!
//! Both reject with HTTP 401 when the token is missing or unknown.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::{app::AppState, error::AppError, services::credential_service::hash_secret};

pub use crate::session::SessionContext;

/// Extract `<token>` from an `Authorization: Bearer <token>` header.
fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Customer session middleware.
///
/// # Flow
///
/// 1. Extract `Authorization: Bearer <token>` header from request
/// 2. Look the token up in the session store
/// 3. If found: inject `SessionContext` into request, call next handler
/// 4. If not found: return 401 Unauthorized error
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let context = bearer_token(&request)
        .and_then(|token| state.sessions.resolve(token))
        .ok_or(AppError::InvalidSession)?;

    // Route handlers can now extract this using Extension<SessionContext>
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}

/// Administrative key middleware.
///
/// With no `ADMIN_KEY_HASH` configured every request is rejected.
pub async fn admin_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let expected = state
        .admin_key_hash
        .as_deref()
        .ok_or(AppError::InvalidAdminKey)?;

    let presented = bearer_token(&request).ok_or(AppError::InvalidAdminKey)?;

    if !hash_secret(presented).eq_ignore_ascii_case(expected.trim()) {
        tracing::warn!("Rejected administrative request with wrong key");
        return Err(AppError::InvalidAdminKey);
    }

    Ok(next.run(request).await)
}
