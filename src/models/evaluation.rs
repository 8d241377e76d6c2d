//! Loan evaluation models.
//!
//! An evaluation records what the decision engine concluded for one loan
//! submission. Rows are inserted once and never updated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a `loan_evaluations` record.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct LoanEvaluation {
    pub id: Uuid,
    pub loan_id: Uuid,

    /// Raw classifier label, e.g. "P3"
    pub predicted_class: String,

    /// Risk tier derived from the label: alto, medio, bajo, muy bajo or desconocido
    pub risk_level: String,

    pub monthly_payment: f64,

    /// Debt-to-income ratio as a fraction (0.23 = 23%)
    pub dti: f64,

    /// "Approved", "Rejected" or "Manual Review"
    pub decision: String,

    pub evaluated_at: DateTime<Utc>,
}

/// Values needed to insert an evaluation row; the loan id is supplied at insert time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvaluation {
    pub predicted_class: String,
    pub risk_level: String,
    pub monthly_payment: f64,
    pub dti: f64,
    pub decision: String,
}

/// An evaluation joined with the loan it belongs to, for the history view.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub loan_type: String,
    pub amount_cents: i64,
    pub term_months: i32,
    pub loan_status: String,
    pub predicted_class: String,
    pub risk_level: String,
    pub monthly_payment: f64,
    pub dti: f64,
    pub decision: String,
    pub evaluated_at: DateTime<Utc>,
}

/// A loan, from any customer, whose latest evaluation asked for manual review.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct PendingReview {
    pub loan_id: Uuid,
    pub customer_id: Uuid,
    pub full_name: String,
    pub loan_type: String,
    pub amount_cents: i64,
    pub term_months: i32,
    pub applied_at: DateTime<Utc>,
    pub risk_level: String,
    pub dti: f64,
    pub evaluated_at: DateTime<Utc>,
}
