//! Administrative HTTP handlers.
//!
//! - GET /api/v1/admin/loans/pending-review - Loans awaiting a human decision

use axum::{Json, extract::State};

use crate::{app::AppState, error::AppError, models::evaluation::PendingReview};

/// Loans of every customer whose latest evaluation asked for manual review.
pub async fn pending_review(
    State(state): State<AppState>,
) -> Result<Json<Vec<PendingReview>>, AppError> {
    let pending = state.store.pending_review_loans().await?;

    Ok(Json(pending))
}
