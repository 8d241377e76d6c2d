//! Login and logout handlers.
//!
//! - POST /api/v1/login - Verify credentials and open a session
//! - POST /api/v1/logout - Close the current session

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{
    app::AppState,
    error::AppError,
    models::customer::{LoginRequest, LoginResponse},
    services::credential_service,
    session::SessionContext,
};

/// Sign a customer in.
///
/// # Request Body
///
/// ```json
/// {
///   "dni": "45879632",
///   "card_number": "4557880011223344",
///   "password": "123456"
/// }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: session token and customer identity
/// - **Error (400)**: a field is blank, or the body is not JSON; the store is not queried
/// - **Error (401)**: no matching customer, or the store could not be reached
///
/// ```json
/// {
///   "token": "5f0c...e9",
///   "customer": {
///     "customer_id": "550e8400-e29b-41d4-a716-446655440000",
///     "full_name": "María Quispe",
///     "email": "maria@example.com"
///   },
///   "message": "Welcome María Quispe"
/// }
/// ```
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(request) = payload?;

    if !request.is_complete() {
        tracing::warn!("Login attempted with missing fields");
        return Err(AppError::MissingFields);
    }

    let customer = credential_service::verify_customer(
        state.store.as_ref(),
        &request.dni,
        &request.card_number,
        &request.password,
    )
    .await
    .ok_or_else(|| {
        tracing::info!("Login rejected");
        AppError::InvalidCredentials
    })?;

    let token = state.sessions.open(customer.clone());
    tracing::info!(customer_id = %customer.customer_id, "Customer signed in");

    Ok(Json(LoginResponse {
        token,
        message: format!("Welcome {}", customer.full_name),
        customer,
    }))
}

/// Sign the current customer out.
///
/// # Response
///
/// Returns 204 No Content. The token stops working immediately.
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> StatusCode {
    state.sessions.close(&session.token);
    tracing::info!(customer_id = %session.customer.customer_id, "Customer signed out");

    StatusCode::NO_CONTENT
}
