//! Consolidated position and profile handlers.
//!
//! - GET /api/v1/dashboard - Greeting, accounts and loans in one response
//! - GET /api/v1/profile - Stored scoring attributes for pre-filling the loan form

use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::{
    app::AppState,
    error::AppError,
    models::{
        account::AccountResponse,
        customer::{CustomerIdentity, CustomerProfile},
        loan::Loan,
    },
    session::SessionContext,
};

/// Consolidated position shown right after login.
#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub customer: CustomerIdentity,
    pub message: String,
    pub accounts: Vec<AccountResponse>,
    pub loans: Vec<Loan>,
}

/// Consolidated position for the signed-in customer.
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<DashboardResponse>, AppError> {
    let customer_id = session.customer.customer_id;
    let accounts = state.store.accounts_for(customer_id).await?;
    let loans = state.store.loans_for(customer_id).await?;

    Ok(Json(DashboardResponse {
        message: format!("Welcome {}", session.customer.full_name),
        customer: session.customer,
        accounts: accounts.into_iter().map(Into::into).collect(),
        loans,
    }))
}

/// Scoring attributes on file, or `null` when the customer has no profile.
pub async fn profile(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Option<CustomerProfile>>, AppError> {
    let profile = state
        .store
        .customer_profile(session.customer.customer_id)
        .await?;

    Ok(Json(profile))
}
