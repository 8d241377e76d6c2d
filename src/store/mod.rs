//! Account/loan query layer.
//!
//! [`BankStore`] is the storage port: one method per read query or write the
//! application performs, each scoped to a single customer unless stated
//! otherwise. Handlers and services receive the store as an explicitly passed
//! `Arc<dyn BankStore>`; nothing reaches for a global connection.
//!
//! Two adapters exist:
//! - [`postgres::PgStore`] backed by a sqlx `PgPool`
//! - [`memory::InMemoryStore`] holding everything in process memory
//!
//! # Write atomicity
//!
//! Every method is its own unit of work. The one exception is
//! [`BankStore::record_application`], which writes a loan, its evaluation and
//! the resulting loan status. Its default body issues the three writes one
//! after another, so a failure after the first leaves a "Pending" loan with no
//! evaluation; the error names the stage that failed. Adapters with
//! transactions override it to commit all three or none.

use std::fmt;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    account::Account,
    customer::{CustomerIdentity, CustomerProfile},
    evaluation::{EvaluationRecord, LoanEvaluation, NewEvaluation, PendingReview},
    loan::{Loan, LoanStatus, NewLoan},
    transaction::TransactionRecord,
};

pub mod memory;
pub mod postgres;

/// Failure reported by a store adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached (connection refused, pool exhausted, I/O).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store was reached but rejected or failed the statement.
    #[error("store query failed: {0}")]
    Query(String),
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::Unavailable(message.into())
    }

    pub fn query(message: impl Into<String>) -> Self {
        StoreError::Query(message.into())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_) => StoreError::Unavailable(err.to_string()),
            _ => StoreError::Query(err.to_string()),
        }
    }
}

/// Statement within a loan submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    Loan,
    Evaluation,
    Status,
    Commit,
}

impl fmt::Display for WriteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WriteStage::Loan => "loan",
            WriteStage::Evaluation => "evaluation",
            WriteStage::Status => "loan status",
            WriteStage::Commit => "commit",
        };
        f.write_str(name)
    }
}

/// A loan submission write that failed, and where.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{stage} write failed: {source}")]
pub struct ApplicationWriteError {
    pub stage: WriteStage,
    pub source: StoreError,
}

impl ApplicationWriteError {
    pub fn new(stage: WriteStage, source: StoreError) -> Self {
        Self { stage, source }
    }
}

/// Rows produced by a successful loan submission.
#[derive(Debug, Clone)]
pub struct RecordedApplication {
    pub loan: Loan,
    pub evaluation: LoanEvaluation,
}

/// Storage port for customers, accounts, transactions and loans.
#[async_trait]
pub trait BankStore: Send + Sync {
    /// Cheap connectivity probe.
    async fn ping(&self) -> Result<(), StoreError>;

    /// First customer matching all three login values exactly.
    async fn find_customer(
        &self,
        dni: &str,
        card_number: &str,
        password_hash: &str,
    ) -> Result<Option<CustomerIdentity>, StoreError>;

    /// Scoring attributes, if the customer has a profile row.
    async fn customer_profile(
        &self,
        customer_id: Uuid,
    ) -> Result<Option<CustomerProfile>, StoreError>;

    /// All accounts owned by the customer.
    async fn accounts_for(&self, customer_id: Uuid) -> Result<Vec<Account>, StoreError>;

    /// Transactions across all of the customer's accounts, newest first.
    async fn transactions_for(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<TransactionRecord>, StoreError>;

    /// The customer's loans, most recent application first.
    async fn loans_for(&self, customer_id: Uuid) -> Result<Vec<Loan>, StoreError>;

    /// Evaluations of the customer's loans joined to the loan, newest first.
    async fn evaluations_for(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<EvaluationRecord>, StoreError>;

    /// Loans of every customer whose latest evaluation decided "Manual Review".
    async fn pending_review_loans(&self) -> Result<Vec<PendingReview>, StoreError>;

    /// Insert a loan with status "Pending" and return the stored row.
    async fn create_loan(&self, loan: &NewLoan) -> Result<Loan, StoreError>;

    /// Insert an evaluation for an existing loan.
    async fn create_evaluation(
        &self,
        loan_id: Uuid,
        evaluation: &NewEvaluation,
    ) -> Result<LoanEvaluation, StoreError>;

    /// Move a loan to a new lifecycle status.
    async fn set_loan_status(&self, loan_id: Uuid, status: LoanStatus) -> Result<(), StoreError>;

    /// Persist a submitted application: loan, evaluation, then final status.
    async fn record_application(
        &self,
        loan: &NewLoan,
        evaluation: &NewEvaluation,
        status: LoanStatus,
    ) -> Result<RecordedApplication, ApplicationWriteError> {
        let mut loan = self
            .create_loan(loan)
            .await
            .map_err(|e| ApplicationWriteError::new(WriteStage::Loan, e))?;

        let evaluation = self
            .create_evaluation(loan.id, evaluation)
            .await
            .map_err(|e| ApplicationWriteError::new(WriteStage::Evaluation, e))?;

        self.set_loan_status(loan.id, status)
            .await
            .map_err(|e| ApplicationWriteError::new(WriteStage::Status, e))?;
        loan.status = status.as_str().to_string();

        Ok(RecordedApplication { loan, evaluation })
    }
}
