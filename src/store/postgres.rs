//! PostgreSQL implementation of the query layer.
//!
//! Every read filters on the owning customer so one customer can never see
//! another's rows. Loan submissions run inside a single database transaction.

use async_trait::async_trait;
use sqlx::PgExecutor;
use uuid::Uuid;

use super::{ApplicationWriteError, BankStore, RecordedApplication, StoreError, WriteStage};
use crate::{
    db::DbPool,
    models::{
        account::Account,
        customer::{CustomerIdentity, CustomerProfile},
        evaluation::{EvaluationRecord, LoanEvaluation, NewEvaluation, PendingReview},
        loan::{Loan, LoanStatus, NewLoan},
        transaction::TransactionRecord,
    },
};

const LOAN_COLUMNS: &str = "id, customer_id, loan_type, amount_cents, term_months, \
     existing_debt_cents, monthly_income_cents, status, applied_at";

const EVALUATION_COLUMNS: &str =
    "id, loan_id, predicted_class, risk_level, monthly_payment, dti, decision, evaluated_at";

/// Store backed by a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

async fn insert_loan<'e, E: PgExecutor<'e>>(executor: E, loan: &NewLoan) -> Result<Loan, sqlx::Error> {
    sqlx::query_as::<_, Loan>(&format!(
        r#"
        INSERT INTO loans (
            customer_id,
            loan_type,
            amount_cents,
            term_months,
            existing_debt_cents,
            monthly_income_cents
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {LOAN_COLUMNS}
        "#
    ))
    .bind(loan.customer_id)
    .bind(loan.loan_type.as_str())
    .bind(loan.amount_cents)
    .bind(loan.term_months)
    .bind(loan.existing_debt_cents)
    .bind(loan.monthly_income_cents)
    .fetch_one(executor)
    .await
}

async fn insert_evaluation<'e, E: PgExecutor<'e>>(
    executor: E,
    loan_id: Uuid,
    evaluation: &NewEvaluation,
) -> Result<LoanEvaluation, sqlx::Error> {
    sqlx::query_as::<_, LoanEvaluation>(&format!(
        r#"
        INSERT INTO loan_evaluations (
            loan_id,
            predicted_class,
            risk_level,
            monthly_payment,
            dti,
            decision
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {EVALUATION_COLUMNS}
        "#
    ))
    .bind(loan_id)
    .bind(&evaluation.predicted_class)
    .bind(&evaluation.risk_level)
    .bind(evaluation.monthly_payment)
    .bind(evaluation.dti)
    .bind(&evaluation.decision)
    .fetch_one(executor)
    .await
}

async fn update_loan_status<'e, E: PgExecutor<'e>>(
    executor: E,
    loan_id: Uuid,
    status: LoanStatus,
) -> Result<(), StoreError> {
    let updated = sqlx::query("UPDATE loans SET status = $1 WHERE id = $2")
        .bind(status.as_str())
        .bind(loan_id)
        .execute(executor)
        .await?
        .rows_affected();

    if updated == 0 {
        return Err(StoreError::query(format!("loan {} not found", loan_id)));
    }

    Ok(())
}

#[async_trait]
impl BankStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_customer(
        &self,
        dni: &str,
        card_number: &str,
        password_hash: &str,
    ) -> Result<Option<CustomerIdentity>, StoreError> {
        // Duplicate rows are possible; the first one wins
        let customer = sqlx::query_as::<_, CustomerIdentity>(
            r#"
            SELECT customer_id, full_name, email
            FROM customers
            WHERE dni = $1 AND card_number = $2 AND internet_password_hash = $3
            LIMIT 1
            "#,
        )
        .bind(dni)
        .bind(card_number)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn customer_profile(
        &self,
        customer_id: Uuid,
    ) -> Result<Option<CustomerProfile>, StoreError> {
        let profile = sqlx::query_as::<_, CustomerProfile>(
            r#"
            SELECT customer_id, age, monthly_income_cents, credit_score, months_employed, updated_at
            FROM customer_profiles
            WHERE customer_id = $1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn accounts_for(&self, customer_id: Uuid) -> Result<Vec<Account>, StoreError> {
        let accounts = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, customer_id, account_type, account_number, balance_cents, currency, status, opened_at
            FROM accounts
            WHERE customer_id = $1
            ORDER BY account_number
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }

    async fn transactions_for(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let transactions = sqlx::query_as::<_, TransactionRecord>(
            r#"
            SELECT
                t.id,
                t.account_id,
                a.account_number,
                t.description,
                t.amount_cents,
                t.balance_after_cents,
                a.currency,
                t.posted_at
            FROM transactions t
            JOIN accounts a ON a.id = t.account_id
            WHERE a.customer_id = $1
            ORDER BY t.posted_at DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    async fn loans_for(&self, customer_id: Uuid) -> Result<Vec<Loan>, StoreError> {
        let loans = sqlx::query_as::<_, Loan>(&format!(
            "SELECT {LOAN_COLUMNS} FROM loans WHERE customer_id = $1 ORDER BY applied_at DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    async fn evaluations_for(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<EvaluationRecord>, StoreError> {
        let evaluations = sqlx::query_as::<_, EvaluationRecord>(
            r#"
            SELECT
                e.id,
                e.loan_id,
                l.loan_type,
                l.amount_cents,
                l.term_months,
                l.status AS loan_status,
                e.predicted_class,
                e.risk_level,
                e.monthly_payment,
                e.dti,
                e.decision,
                e.evaluated_at
            FROM loan_evaluations e
            JOIN loans l ON l.id = e.loan_id
            WHERE l.customer_id = $1
            ORDER BY e.evaluated_at DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(evaluations)
    }

    async fn pending_review_loans(&self) -> Result<Vec<PendingReview>, StoreError> {
        // Only the most recent evaluation of each loan counts
        let pending = sqlx::query_as::<_, PendingReview>(
            r#"
            SELECT
                l.id AS loan_id,
                l.customer_id,
                c.full_name,
                l.loan_type,
                l.amount_cents,
                l.term_months,
                l.applied_at,
                e.risk_level,
                e.dti,
                e.evaluated_at
            FROM loans l
            JOIN customers c ON c.customer_id = l.customer_id
            JOIN LATERAL (
                SELECT risk_level, dti, decision, evaluated_at
                FROM loan_evaluations
                WHERE loan_id = l.id
                ORDER BY evaluated_at DESC
                LIMIT 1
            ) e ON TRUE
            WHERE e.decision = 'Manual Review'
            ORDER BY e.evaluated_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(pending)
    }

    async fn create_loan(&self, loan: &NewLoan) -> Result<Loan, StoreError> {
        Ok(insert_loan(&self.pool, loan).await?)
    }

    async fn create_evaluation(
        &self,
        loan_id: Uuid,
        evaluation: &NewEvaluation,
    ) -> Result<LoanEvaluation, StoreError> {
        Ok(insert_evaluation(&self.pool, loan_id, evaluation).await?)
    }

    async fn set_loan_status(&self, loan_id: Uuid, status: LoanStatus) -> Result<(), StoreError> {
        update_loan_status(&self.pool, loan_id, status).await
    }

    /// All three writes share one transaction; dropping `tx` on an early
    /// return rolls it back.
    async fn record_application(
        &self,
        loan: &NewLoan,
        evaluation: &NewEvaluation,
        status: LoanStatus,
    ) -> Result<RecordedApplication, ApplicationWriteError> {
        let stage_error = |stage: WriteStage| {
            move |e: sqlx::Error| ApplicationWriteError::new(stage, StoreError::from(e))
        };

        let mut tx = self.pool.begin().await.map_err(stage_error(WriteStage::Loan))?;

        let mut loan = insert_loan(&mut *tx, loan)
            .await
            .map_err(stage_error(WriteStage::Loan))?;

        let evaluation = insert_evaluation(&mut *tx, loan.id, evaluation)
            .await
            .map_err(stage_error(WriteStage::Evaluation))?;

        update_loan_status(&mut *tx, loan.id, status)
            .await
            .map_err(|e| ApplicationWriteError::new(WriteStage::Status, e))?;
        loan.status = status.as_str().to_string();

        tx.commit().await.map_err(stage_error(WriteStage::Commit))?;

        Ok(RecordedApplication { loan, evaluation })
    }
}
