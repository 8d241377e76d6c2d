//! Transaction history HTTP handler.
//!
//! - GET /api/v1/transactions - Postings across all of the customer's accounts

use crate::{
    app::AppState, error::AppError, models::transaction::TransactionRecord,
    session::SessionContext,
};
use axum::{Extension, Json, extract::State};

/// List transactions for every account the customer owns, newest first.
///
/// # Response (200)
///
/// ```json
/// [
///   {
///     "id": "770e8400-...",
///     "account_id": "550e8400-...",
///     "account_number": "191-00012345-0-11",
///     "description": "Salary",
///     "amount_cents": 350000,
///     "balance_after_cents": 1250050,
///     "currency": "PEN",
///     "posted_at": "2025-12-21T16:00:00Z"
///   }
/// ]
/// ```
pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Vec<TransactionRecord>>, AppError> {
    let transactions = state
        .store
        .transactions_for(session.customer.customer_id)
        .await?;

    Ok(Json(transactions))
}
