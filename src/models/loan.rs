//! Loan data models and loan application request types.
//!
//! This module defines:
//! - `LoanType`: The fixed product catalogue, each with a nominal annual rate
//! - `LoanStatus`: The loan lifecycle (Pending → Approved | Rejected | Manual Review)
//! - `Loan`: Database entity for a loan application
//! - `NewLoan`: Values inserted when an application is recorded
//! - `LoanApplicationRequest`: The new-application form

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Loan product. The discriminant selects the annual nominal rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanType {
    Personal,
    Mortgage,
    Auto,
    Consumer,
}

impl LoanType {
    /// Every product offered, in catalogue order.
    pub const ALL: [LoanType; 4] = [
        LoanType::Personal,
        LoanType::Mortgage,
        LoanType::Auto,
        LoanType::Consumer,
    ];

    /// Annual nominal interest rate as a fraction (0.25 = 25%).
    pub fn annual_rate(self) -> f64 {
        match self {
            LoanType::Personal => 0.25,
            LoanType::Mortgage => 0.10,
            LoanType::Auto => 0.18,
            LoanType::Consumer => 0.30,
        }
    }

    /// Value stored in `loans.loan_type`.
    pub fn as_str(self) -> &'static str {
        match self {
            LoanType::Personal => "Personal",
            LoanType::Mortgage => "Mortgage",
            LoanType::Auto => "Auto",
            LoanType::Consumer => "Consumer",
        }
    }
}

impl fmt::Display for LoanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LoanType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown loan type: {}", s))
    }
}

/// Loan lifecycle status.
///
/// `ManualReview` is not terminal: it waits for a human decision, which is
/// handled outside this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    Pending,
    Approved,
    Rejected,
    #[serde(rename = "Manual Review")]
    ManualReview,
}

impl LoanStatus {
    /// Value stored in `loans.status`.
    pub fn as_str(self) -> &'static str {
        match self {
            LoanStatus::Pending => "Pending",
            LoanStatus::Approved => "Approved",
            LoanStatus::Rejected => "Rejected",
            LoanStatus::ManualReview => "Manual Review",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a loan record from the database.
///
/// # Database Table
///
/// Maps to the `loans` table. Amounts are stored in cents. The applicant's
/// monthly income is stored alongside the loan so the evaluation's DTI can be
/// recomputed from this row alone.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct Loan {
    pub id: Uuid,
    pub customer_id: Uuid,

    /// One of `LoanType::as_str`
    pub loan_type: String,

    /// Requested principal in cents
    pub amount_cents: i64,

    /// Repayment term in months
    pub term_months: i32,

    /// Monthly debt service the applicant already carries, in cents
    pub existing_debt_cents: i64,

    /// Net monthly income declared on the application, in cents
    pub monthly_income_cents: i64,

    /// One of `LoanStatus::as_str`; "Pending" on insert
    pub status: String,

    pub applied_at: DateTime<Utc>,
}

/// Values needed to insert a loan row.
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub customer_id: Uuid,
    pub loan_type: LoanType,
    pub amount_cents: i64,
    pub term_months: i32,
    pub existing_debt_cents: i64,
    pub monthly_income_cents: i64,
}

/// New loan application form.
///
/// # JSON Example
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
/// Monetary values are in currency units and are rounded to cents before
/// anything is computed, so a stored loan reproduces its evaluation exactly.
/// `income` is the classifier's income feature and defaults to
/// `net_monthly_income` when omitted.
#[derive(Debug, Clone, Deserialize)]
pub struct LoanApplicationRequest {
    pub loan_type: LoanType,
    pub amount: f64,
    pub term_months: u32,

    #[serde(default)]
    pub existing_monthly_debt: f64,

    pub net_monthly_income: f64,

    pub age: u32,

    #[serde(default)]
    pub income: Option<f64>,

    pub credit_score: u32,
    pub months_employed: u32,
}
