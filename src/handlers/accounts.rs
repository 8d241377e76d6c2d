//! Account HTTP handlers.
//!
//! - GET /api/v1/accounts - List the signed-in customer's accounts

use crate::{app::AppState, error::AppError, models::account::AccountResponse, session::SessionContext};
use axum::{Extension, Json, extract::State};

/// List all accounts for the signed-in customer.
///
/// # Response
///
/// - **Success (200 OK)**: Returns array of accounts (may be empty)
/// - **Error (401)**: Missing or expired session
/// - **Error (503)**: Database unreachable
///
/// ```json
/// [
///   {
///     "id": "550e8400-e29b-41d4-a716-446655440000",
///     "account_type": "Savings",
///     "account_number": "191-00012345-0-11",
///     "balance_cents": 1250050,
///     "currency": "PEN",
///     "status": "Active",
///     "opened_at": "2024-03-01T10:00:00Z"
///   }
/// ]
/// ```
pub async fn list_accounts(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Vec<AccountResponse>>, AppError> {
    let accounts = state
        .store
        .accounts_for(session.customer.customer_id)
        .await?;

    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}
