//! Loan HTTP handlers.
//!
//! - GET /api/v1/loans - The customer's loans, most recent first
//! - GET /api/v1/loans/evaluations - Evaluation history joined to loans
//! - POST /api/v1/loans/quote - Evaluate an application without saving it
//! - POST /api/v1/loans - Submit an application

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{
    app::AppState,
    error::AppError,
    models::{
        evaluation::EvaluationRecord,
        loan::{Loan, LoanApplicationRequest},
    },
    services::{
        loan_engine::Assessment,
        loan_service::{self, SubmissionOutcome},
    },
    session::SessionContext,
};

/// List the signed-in customer's loans.
pub async fn list_loans(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Vec<Loan>>, AppError> {
    let loans = state.store.loans_for(session.customer.customer_id).await?;

    Ok(Json(loans))
}

/// List evaluations of the signed-in customer's loans.
pub async fn list_evaluations(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Vec<EvaluationRecord>>, AppError> {
    let evaluations = state
        .store
        .evaluations_for(session.customer.customer_id)
        .await?;

    Ok(Json(evaluations))
}

/// Preview the decision for an application.
///
/// # Request Body
///
/// ```json
/// {
///   "loan_type": "Mortgage",
///   "amount": 10000.0,
///   "term_months": 24,
///   "existing_monthly_debt": 0.0,
///   "net_monthly_income": 2000.0,
///   "age": 35,
///   "credit_score": 720,
///   "months_employed": 48
/// }
/// ```
///
/// # Response (200)
///
/// ```json
/// {
///   "loan_type": "Mortgage",
///   "annual_rate": 0.1,
///   "monthly_rate": 0.008333333333333333,
///   "monthly_payment": 461.4492633751664,
///   "dti": 0.2307246316875832,
///   "predicted_class": "P3",
///   "risk_tier": "bajo",
///   "decision": "Approved"
/// }
/// ```
pub async fn quote_loan(
    State(state): State<AppState>,
    Extension(_session): Extension<SessionContext>,
    payload: Result<Json<LoanApplicationRequest>, JsonRejection>,
) -> Result<Json<Assessment>, AppError> {
    let Json(request) = payload?;
    let assessment = loan_service::quote(state.scorer.as_ref(), &request)?;

    Ok(Json(assessment))
}

/// Submit an application: evaluate it and record the loan and evaluation.
///
/// # Response
///
/// - **Success (201 Created)**: loan row, evaluation row and assessment
/// - **Error (400)**: invalid or malformed form, nothing saved
/// - **Error (500)**: a write failed; the error code names which one
pub async fn submit_loan(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    payload: Result<Json<LoanApplicationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmissionOutcome>), AppError> {
    let Json(request) = payload?;
    let outcome = loan_service::submit(
        state.store.as_ref(),
        state.scorer.as_ref(),
        session.customer.customer_id,
        &request,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(outcome)))
}
