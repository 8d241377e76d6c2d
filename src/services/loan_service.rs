//! Loan origination service.
//!
//! This service handles:
//! - Validating a new-application form
//! - Scoring the applicant with the configured risk scorer
//! - Running the decision engine
//! - Persisting the loan, its evaluation and the resulting status
//!
//! Form amounts are rounded to cents first, and the engine runs on those
//! rounded values, so what is stored reproduces the evaluation exactly.

use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        evaluation::{LoanEvaluation, NewEvaluation},
        loan::{Loan, LoanApplicationRequest, LoanStatus, LoanType, NewLoan},
    },
    services::{
        loan_engine::{self, Assessment, LoanTerms, cents_to_units},
        risk_scorer::{RiskFeatures, RiskScorer},
    },
    store::BankStore,
};

/// Longest repayment term accepted, in months.
pub const MAX_TERM_MONTHS: u32 = 480;

/// Largest amount accepted in any monetary field, in currency units.
pub const MAX_AMOUNT: f64 = 1_000_000_000.0;

/// A validated application with amounts in cents.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedApplication {
    pub loan_type: LoanType,
    pub amount_cents: i64,
    pub term_months: u32,
    pub existing_debt_cents: i64,
    pub monthly_income_cents: i64,
    pub features: RiskFeatures,
}

impl PreparedApplication {
    /// Engine inputs built from the rounded amounts.
    pub fn terms(&self) -> LoanTerms {
        LoanTerms {
            loan_type: self.loan_type,
            principal: cents_to_units(self.amount_cents),
            term_months: self.term_months,
            existing_monthly_debt: cents_to_units(self.existing_debt_cents),
            net_monthly_income: cents_to_units(self.monthly_income_cents),
        }
    }

    fn new_loan(&self, customer_id: Uuid) -> Result<NewLoan, AppError> {
        // Bounded by MAX_TERM_MONTHS during validation
        let term_months = i32::try_from(self.term_months)
            .map_err(|_| AppError::InvalidRequest("Term is too long".to_string()))?;

        Ok(NewLoan {
            customer_id,
            loan_type: self.loan_type,
            amount_cents: self.amount_cents,
            term_months,
            existing_debt_cents: self.existing_debt_cents,
            monthly_income_cents: self.monthly_income_cents,
        })
    }
}

/// Result of a persisted submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    pub loan: Loan,
    pub evaluation: LoanEvaluation,
    pub assessment: Assessment,
}

fn to_cents(field: &str, value: f64, allow_zero: bool) -> Result<i64, AppError> {
    if !value.is_finite() || value > MAX_AMOUNT {
        return Err(AppError::InvalidRequest(format!("{} is out of range", field)));
    }
    if value < 0.0 || (!allow_zero && value == 0.0) {
        let rule = if allow_zero { "cannot be negative" } else { "must be positive" };
        return Err(AppError::InvalidRequest(format!("{} {}", field, rule)));
    }

    // Bounded by MAX_AMOUNT above, so the product fits in i64
    let cents = (value * 100.0).round() as i64;
    if !allow_zero && cents == 0 {
        return Err(AppError::InvalidRequest(format!("{} must be positive", field)));
    }

    Ok(cents)
}

/// Validate a new-application form and round its amounts to cents.
///
/// # Errors
///
/// `InvalidRequest` describing the first invalid field.
pub fn prepare(request: &LoanApplicationRequest) -> Result<PreparedApplication, AppError> {
    let amount_cents = to_cents("Amount", request.amount, false)?;
    let existing_debt_cents = to_cents("Existing monthly debt", request.existing_monthly_debt, true)?;
    let monthly_income_cents = to_cents("Net monthly income", request.net_monthly_income, true)?;

    if request.term_months == 0 || request.term_months > MAX_TERM_MONTHS {
        return Err(AppError::InvalidRequest(format!(
            "Term must be between 1 and {} months",
            MAX_TERM_MONTHS
        )));
    }
    if !(18..=120).contains(&request.age) {
        return Err(AppError::InvalidRequest(
            "Age must be between 18 and 120".to_string(),
        ));
    }
    if request.credit_score > 1000 {
        return Err(AppError::InvalidRequest(
            "Credit score must be between 0 and 1000".to_string(),
        ));
    }

    let income = match request.income {
        Some(income) => cents_to_units(to_cents("Income", income, true)?),
        None => cents_to_units(monthly_income_cents),
    };

    Ok(PreparedApplication {
        loan_type: request.loan_type,
        amount_cents,
        term_months: request.term_months,
        existing_debt_cents,
        monthly_income_cents,
        features: RiskFeatures {
            age: request.age,
            income,
            credit_score: request.credit_score,
            months_employed: request.months_employed,
        },
    })
}

/// Score and assess a prepared application.
pub fn evaluate(scorer: &dyn RiskScorer, application: &PreparedApplication) -> Assessment {
    let predicted_class = scorer.predict(&application.features);
    loan_engine::assess(&application.terms(), &predicted_class)
}

/// Preview the decision for a form without saving anything.
///
/// # Errors
///
/// `InvalidRequest` if the form fails validation.
pub fn quote(
    scorer: &dyn RiskScorer,
    request: &LoanApplicationRequest,
) -> Result<Assessment, AppError> {
    let application = prepare(request)?;
    Ok(evaluate(scorer, &application))
}

fn evaluation_row(assessment: &Assessment) -> NewEvaluation {
    NewEvaluation {
        predicted_class: assessment.predicted_class.clone(),
        risk_level: assessment.risk_tier.as_str().to_string(),
        monthly_payment: assessment.monthly_payment,
        dti: assessment.dti,
        decision: assessment.decision.as_str().to_string(),
    }
}

/// Evaluate a form and record the loan, its evaluation and the final status.
///
/// # Errors
///
/// - `InvalidRequest`: the form fails validation (nothing is written)
/// - `Write`: a statement failed; the error names which one
pub async fn submit(
    store: &dyn BankStore,
    scorer: &dyn RiskScorer,
    customer_id: Uuid,
    request: &LoanApplicationRequest,
) -> Result<SubmissionOutcome, AppError> {
    let application = prepare(request)?;
    let assessment = evaluate(scorer, &application);
    let new_loan = application.new_loan(customer_id)?;

    let recorded = store
        .record_application(
            &new_loan,
            &evaluation_row(&assessment),
            LoanStatus::from(assessment.decision),
        )
        .await?;

    tracing::info!(
        loan_id = %recorded.loan.id,
        %customer_id,
        loan_type = %assessment.loan_type,
        predicted_class = %assessment.predicted_class,
        dti = assessment.dti,
        decision = assessment.decision.as_str(),
        "Loan application recorded"
    );

    Ok(SubmissionOutcome {
        loan: recorded.loan,
        evaluation: recorded.evaluation,
        assessment,
    })
}
