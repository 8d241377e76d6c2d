//! Loan decision engine.
//!
//! Pure functions turning an application's numbers plus a classifier label
//! into a monthly payment, a debt-to-income ratio and a decision. Nothing here
//! touches the store, so an evaluation can always be recomputed from a stored
//! loan row and its predicted class.
//!
//! # Payment formula
//!
//! The annual nominal rate is divided by 12 (a flat conversion, not an
//! effective-rate one). With monthly rate `r`, principal `pv` and `n` months:
//!
//! - `r == 0`: `pv / n`
//! - otherwise: `r·pv / (1 − (1 + r)^(−n))`
//!
//! # Decision policy
//!
//! Evaluated in order, first match wins:
//! 1. risk tier bajo or muy bajo and DTI ≤ 0.35 → Approved
//! 2. risk tier alto or DTI > 0.50 → Rejected
//! 3. otherwise → Manual Review

use serde::{Deserialize, Serialize};

use crate::models::loan::{Loan, LoanStatus, LoanType};

/// Smallest income used as a DTI denominator.
pub const INCOME_FLOOR: f64 = 1e-9;

/// Highest DTI that can be approved automatically.
pub const APPROVAL_DTI_LIMIT: f64 = 0.35;

/// DTI above which an application is rejected outright.
pub const REJECTION_DTI_LIMIT: f64 = 0.50;

/// Qualitative risk bucket derived from the classifier label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    #[serde(rename = "alto")]
    High,
    #[serde(rename = "medio")]
    Medium,
    #[serde(rename = "bajo")]
    Low,
    #[serde(rename = "muy bajo")]
    VeryLow,
    #[serde(rename = "desconocido")]
    Unknown,
}

impl RiskTier {
    /// Map a classifier label to its tier. Unrecognised labels are `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "P1" => RiskTier::High,
            "P2" => RiskTier::Medium,
            "P3" => RiskTier::Low,
            "P4" => RiskTier::VeryLow,
            _ => RiskTier::Unknown,
        }
    }

    /// Value stored in `loan_evaluations.risk_level`.
    pub fn as_str(self) -> &'static str {
        match self {
            RiskTier::High => "alto",
            RiskTier::Medium => "medio",
            RiskTier::Low => "bajo",
            RiskTier::VeryLow => "muy bajo",
            RiskTier::Unknown => "desconocido",
        }
    }
}

/// Outcome of the decision policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Approved,
    Rejected,
    #[serde(rename = "Manual Review")]
    ManualReview,
}

impl Decision {
    /// Value stored in `loan_evaluations.decision`.
    pub fn as_str(self) -> &'static str {
        LoanStatus::from(self).as_str()
    }
}

impl From<Decision> for LoanStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Approved => LoanStatus::Approved,
            Decision::Rejected => LoanStatus::Rejected,
            Decision::ManualReview => LoanStatus::ManualReview,
        }
    }
}

/// Numeric inputs of an application, in currency units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoanTerms {
    pub loan_type: LoanType,
    pub principal: f64,
    pub term_months: u32,
    pub existing_monthly_debt: f64,
    pub net_monthly_income: f64,
}

impl LoanTerms {
    /// Rebuild the terms a stored loan was evaluated with.
    ///
    /// Returns `None` if the row carries an unknown loan type or a
    /// non-positive term.
    pub fn from_loan(loan: &Loan) -> Option<Self> {
        Some(Self {
            loan_type: loan.loan_type.parse().ok()?,
            principal: cents_to_units(loan.amount_cents),
            term_months: u32::try_from(loan.term_months).ok().filter(|n| *n > 0)?,
            existing_monthly_debt: cents_to_units(loan.existing_debt_cents),
            net_monthly_income: cents_to_units(loan.monthly_income_cents),
        })
    }
}

/// Everything the engine concluded about one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub loan_type: LoanType,
    pub annual_rate: f64,
    pub monthly_rate: f64,
    pub monthly_payment: f64,
    pub dti: f64,
    pub predicted_class: String,
    pub risk_tier: RiskTier,
    pub decision: Decision,
}

pub fn cents_to_units(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Flat monthly rate: annual nominal rate divided by 12.
pub fn monthly_rate(annual_rate: f64) -> f64 {
    annual_rate / 12.0
}

/// Fixed monthly installment that amortizes `principal` over `term_months`.
///
/// A zero-month term has nothing to spread the principal over, so the whole
/// principal is returned.
pub fn monthly_payment(principal: f64, annual_rate: f64, term_months: u32) -> f64 {
    if term_months == 0 {
        return principal;
    }

    let r = monthly_rate(annual_rate);
    let n = f64::from(term_months);

    if r == 0.0 {
        return principal / n;
    }

    r * principal / (1.0 - (1.0 + r).powf(-n))
}

/// Share of net income consumed by existing debt plus the new installment.
pub fn debt_to_income(existing_monthly_debt: f64, payment: f64, net_monthly_income: f64) -> f64 {
    (existing_monthly_debt + payment) / net_monthly_income.max(INCOME_FLOOR)
}

/// Apply the fixed decision policy.
pub fn decide(tier: RiskTier, dti: f64) -> Decision {
    if matches!(tier, RiskTier::Low | RiskTier::VeryLow) && dti <= APPROVAL_DTI_LIMIT {
        Decision::Approved
    } else if tier == RiskTier::High || dti > REJECTION_DTI_LIMIT {
        Decision::Rejected
    } else {
        Decision::ManualReview
    }
}

/// Run the full engine for one application and one classifier label.
pub fn assess(terms: &LoanTerms, predicted_class: &str) -> Assessment {
    let annual_rate = terms.loan_type.annual_rate();
    let payment = monthly_payment(terms.principal, annual_rate, terms.term_months);
    let dti = debt_to_income(terms.existing_monthly_debt, payment, terms.net_monthly_income);
    let risk_tier = RiskTier::from_label(predicted_class);

    Assessment {
        loan_type: terms.loan_type,
        annual_rate,
        monthly_rate: monthly_rate(annual_rate),
        monthly_payment: payment,
        dti,
        predicted_class: predicted_class.to_string(),
        risk_tier,
        decision: decide(risk_tier, dti),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;
    use uuid::Uuid;

    fn close(actual: f64, expected: f64, tolerance: f64) -> bool {
        (actual - expected).abs() <= tolerance
    }

    #[test]
    fn mortgage_payment_follows_amortization_formula() {
        let payment = monthly_payment(10_000.0, LoanType::Mortgage.annual_rate(), 24);

        assert!(close(payment, 461.45, 0.01), "payment was {payment}");
    }

    #[test]
    fn monthly_rate_is_flat_division() {
        assert!(close(monthly_rate(0.10), 0.008_333, 1e-6));
        assert!(close(monthly_rate(0.30), 0.025, 1e-12));
    }

    #[test]
    fn zero_rate_spreads_principal_evenly() {
        assert_eq!(monthly_payment(12_000.0, 0.0, 24), 500.0);
    }

    #[test]
    fn zero_term_returns_principal() {
        assert_eq!(monthly_payment(1_000.0, 0.25, 0), 1_000.0);
    }

    #[test]
    fn payments_over_term_cover_principal_and_interest() {
        for loan_type in LoanType::ALL {
            let payment = monthly_payment(5_000.0, loan_type.annual_rate(), 12);
            assert!(payment * 12.0 > 5_000.0, "{loan_type} payment too low");
        }
    }

    #[test]
    fn dti_matches_worked_example() {
        let payment = monthly_payment(10_000.0, LoanType::Mortgage.annual_rate(), 24);
        let dti = debt_to_income(0.0, payment, 2_000.0);

        assert!(close(dti, 0.2307, 1e-4), "dti was {dti}");
    }

    #[test]
    fn zero_income_is_floored_instead_of_dividing_by_zero() {
        let dti = debt_to_income(100.0, 50.0, 0.0);

        assert!(dti.is_finite());
        assert!(dti > REJECTION_DTI_LIMIT);
    }

    #[rstest]
    #[case("P1", RiskTier::High)]
    #[case("P2", RiskTier::Medium)]
    #[case("P3", RiskTier::Low)]
    #[case("P4", RiskTier::VeryLow)]
    #[case("P5", RiskTier::Unknown)]
    #[case("", RiskTier::Unknown)]
    #[case("p1", RiskTier::Unknown)]
    fn labels_map_to_tiers(#[case] label: &str, #[case] tier: RiskTier) {
        assert_eq!(RiskTier::from_label(label), tier);
    }

    #[rstest]
    #[case(RiskTier::Low, 0.30, Decision::Approved)]
    #[case(RiskTier::VeryLow, 0.35, Decision::Approved)]
    #[case(RiskTier::High, 0.10, Decision::Rejected)]
    #[case(RiskTier::Medium, 0.40, Decision::ManualReview)]
    #[case(RiskTier::Medium, 0.10, Decision::ManualReview)]
    #[case(RiskTier::Low, 0.40, Decision::ManualReview)]
    #[case(RiskTier::Low, 0.51, Decision::Rejected)]
    #[case(RiskTier::Medium, 0.50, Decision::ManualReview)]
    #[case(RiskTier::Unknown, 0.20, Decision::ManualReview)]
    #[case(RiskTier::Unknown, 0.60, Decision::Rejected)]
    fn decision_policy_is_ordered(
        #[case] tier: RiskTier,
        #[case] dti: f64,
        #[case] expected: Decision,
    ) {
        assert_eq!(decide(tier, dti), expected);
    }

    #[test]
    fn assess_combines_payment_dti_and_decision() {
        let terms = LoanTerms {
            loan_type: LoanType::Mortgage,
            principal: 10_000.0,
            term_months: 24,
            existing_monthly_debt: 0.0,
            net_monthly_income: 2_000.0,
        };

        let assessment = assess(&terms, "P3");

        assert_eq!(assessment.risk_tier, RiskTier::Low);
        assert_eq!(assessment.decision, Decision::Approved);
        assert!(close(assessment.monthly_payment, 461.45, 0.01));
        assert_eq!(assessment.annual_rate, 0.10);
    }

    #[test]
    fn unknown_label_falls_through_to_manual_review() {
        let terms = LoanTerms {
            loan_type: LoanType::Personal,
            principal: 1_000.0,
            term_months: 12,
            existing_monthly_debt: 0.0,
            net_monthly_income: 3_000.0,
        };

        let assessment = assess(&terms, "Z9");

        assert_eq!(assessment.risk_tier, RiskTier::Unknown);
        assert_eq!(assessment.decision, Decision::ManualReview);
    }

    #[test]
    fn stored_loan_reproduces_assessment() {
        let loan = Loan {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            loan_type: "Auto".to_string(),
            amount_cents: 2_500_000,
            term_months: 48,
            existing_debt_cents: 30_000,
            monthly_income_cents: 450_000,
            status: "Pending".to_string(),
            applied_at: Utc::now(),
        };
        let terms = LoanTerms::from_loan(&loan).unwrap();

        let first = assess(&terms, "P4");
        let second = assess(&LoanTerms::from_loan(&loan).unwrap(), "P4");

        assert_eq!(first, second);
        assert_eq!(terms.principal, 25_000.0);
        assert_eq!(terms.existing_monthly_debt, 300.0);
    }

    #[test]
    fn stored_loan_with_bad_type_is_not_reproducible() {
        let loan = Loan {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            loan_type: "Boat".to_string(),
            amount_cents: 100,
            term_months: 12,
            existing_debt_cents: 0,
            monthly_income_cents: 100,
            status: "Pending".to_string(),
            applied_at: Utc::now(),
        };

        assert!(LoanTerms::from_loan(&loan).is_none());
    }

    #[test]
    fn decision_strings_match_loan_statuses() {
        assert_eq!(Decision::ManualReview.as_str(), "Manual Review");
        assert_eq!(Decision::Approved.as_str(), "Approved");
        assert_eq!(Decision::Rejected.as_str(), "Rejected");
    }
}
