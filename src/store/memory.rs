//! In-process implementation of the query layer.
//!
//! Useful for running the service without a database and for exercising
//! handlers in tests. It has no transactions: loan submissions go through the
//! default, statement-by-statement [`BankStore::record_application`].
//!
//! Outages and failing writes can be simulated with [`InMemoryStore::set_available`]
//! and [`InMemoryStore::fail_writes_at`].

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{BankStore, StoreError, WriteStage};
use crate::models::{
    account::Account,
    customer::{Customer, CustomerIdentity, CustomerProfile},
    evaluation::{EvaluationRecord, LoanEvaluation, NewEvaluation, PendingReview},
    loan::{Loan, LoanStatus, NewLoan},
    transaction::TransactionRecord,
};

#[derive(Debug, Default)]
struct MemoryState {
    available: bool,
    failing_stage: Option<WriteStage>,
    customers: Vec<Customer>,
    profiles: HashMap<Uuid, CustomerProfile>,
    accounts: Vec<Account>,
    transactions: Vec<TransactionRecord>,
    loans: Vec<Loan>,
    evaluations: Vec<LoanEvaluation>,
}

/// Store keeping all rows in memory behind a lock.
#[derive(Debug)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState {
                available: true,
                ..MemoryState::default()
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::unavailable("in-memory store lock poisoned"))?;
        if !state.available {
            return Err(StoreError::unavailable("connection refused"));
        }
        Ok(state)
    }

    fn write(&self, stage: Option<WriteStage>) -> Result<RwLockWriteGuard<'_, MemoryState>, StoreError> {
        let state = self
            .state
            .write()
            .map_err(|_| StoreError::unavailable("in-memory store lock poisoned"))?;
        if !state.available {
            return Err(StoreError::unavailable("connection refused"));
        }
        if stage.is_some() && state.failing_stage == stage {
            return Err(StoreError::query("simulated write failure"));
        }
        Ok(state)
    }

    fn seed(&self) -> RwLockWriteGuard<'_, MemoryState> {
        // Seeding happens before the store is shared, so a poisoned lock can only
        // come from a panicking seeder; recover the data either way.
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Toggle simulated connectivity. While unavailable every call fails with
    /// [`StoreError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.seed().available = available;
    }

    /// Make writes at `stage` fail with a query error (`None` clears it).
    pub fn fail_writes_at(&self, stage: Option<WriteStage>) {
        self.seed().failing_stage = stage;
    }

    pub fn insert_customer(&self, customer: Customer) {
        self.seed().customers.push(customer);
    }

    pub fn insert_profile(&self, profile: CustomerProfile) {
        self.seed().profiles.insert(profile.customer_id, profile);
    }

    pub fn insert_account(&self, account: Account) {
        self.seed().accounts.push(account);
    }

    /// Record a posting. The record's account number and currency should
    /// match an inserted account.
    pub fn insert_transaction(&self, transaction: TransactionRecord) {
        self.seed().transactions.push(transaction);
    }
}

impl MemoryState {
    fn loan(&self, loan_id: Uuid) -> Option<&Loan> {
        self.loans.iter().find(|l| l.id == loan_id)
    }

    fn latest_evaluation(&self, loan_id: Uuid) -> Option<&LoanEvaluation> {
        // max_by_key keeps the last of equal timestamps, i.e. the latest insert
        self.evaluations
            .iter()
            .filter(|e| e.loan_id == loan_id)
            .max_by_key(|e| e.evaluated_at)
    }
}

#[async_trait]
impl BankStore for InMemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.read().map(|_| ())
    }

    async fn find_customer(
        &self,
        dni: &str,
        card_number: &str,
        password_hash: &str,
    ) -> Result<Option<CustomerIdentity>, StoreError> {
        let state = self.read()?;
        Ok(state
            .customers
            .iter()
            .find(|c| {
                c.dni == dni
                    && c.card_number == card_number
                    && c.internet_password_hash == password_hash
            })
            .map(Customer::identity))
    }

    async fn customer_profile(
        &self,
        customer_id: Uuid,
    ) -> Result<Option<CustomerProfile>, StoreError> {
        Ok(self.read()?.profiles.get(&customer_id).cloned())
    }

    async fn accounts_for(&self, customer_id: Uuid) -> Result<Vec<Account>, StoreError> {
        let state = self.read()?;
        let mut accounts: Vec<Account> = state
            .accounts
            .iter()
            .filter(|a| a.customer_id == customer_id)
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.account_number.cmp(&b.account_number));
        Ok(accounts)
    }

    async fn transactions_for(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let state = self.read()?;
        let mut transactions: Vec<TransactionRecord> = state
            .transactions
            .iter()
            .rev()
            .filter(|t| {
                state
                    .accounts
                    .iter()
                    .any(|a| a.id == t.account_id && a.customer_id == customer_id)
            })
            .cloned()
            .collect();
        transactions.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
        Ok(transactions)
    }

    async fn loans_for(&self, customer_id: Uuid) -> Result<Vec<Loan>, StoreError> {
        let state = self.read()?;
        let mut loans: Vec<Loan> = state
            .loans
            .iter()
            .rev()
            .filter(|l| l.customer_id == customer_id)
            .cloned()
            .collect();
        loans.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
        Ok(loans)
    }

    async fn evaluations_for(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<EvaluationRecord>, StoreError> {
        let state = self.read()?;
        let mut records: Vec<EvaluationRecord> = state
            .evaluations
            .iter()
            .rev()
            .filter_map(|e| {
                let loan = state.loan(e.loan_id)?;
                (loan.customer_id == customer_id).then(|| EvaluationRecord {
                    id: e.id,
                    loan_id: loan.id,
                    loan_type: loan.loan_type.clone(),
                    amount_cents: loan.amount_cents,
                    term_months: loan.term_months,
                    loan_status: loan.status.clone(),
                    predicted_class: e.predicted_class.clone(),
                    risk_level: e.risk_level.clone(),
                    monthly_payment: e.monthly_payment,
                    dti: e.dti,
                    decision: e.decision.clone(),
                    evaluated_at: e.evaluated_at,
                })
            })
            .collect();
        records.sort_by(|a, b| b.evaluated_at.cmp(&a.evaluated_at));
        Ok(records)
    }

    async fn pending_review_loans(&self) -> Result<Vec<PendingReview>, StoreError> {
        let state = self.read()?;
        let mut pending: Vec<PendingReview> = state
            .loans
            .iter()
            .rev()
            .filter_map(|loan| {
                let latest = state.latest_evaluation(loan.id)?;
                if latest.decision != LoanStatus::ManualReview.as_str() {
                    return None;
                }
                let customer = state
                    .customers
                    .iter()
                    .find(|c| c.customer_id == loan.customer_id)?;
                Some(PendingReview {
                    loan_id: loan.id,
                    customer_id: loan.customer_id,
                    full_name: customer.full_name.clone(),
                    loan_type: loan.loan_type.clone(),
                    amount_cents: loan.amount_cents,
                    term_months: loan.term_months,
                    applied_at: loan.applied_at,
                    risk_level: latest.risk_level.clone(),
                    dti: latest.dti,
                    evaluated_at: latest.evaluated_at,
                })
            })
            .collect();
        pending.sort_by(|a, b| b.evaluated_at.cmp(&a.evaluated_at));
        Ok(pending)
    }

    async fn create_loan(&self, loan: &NewLoan) -> Result<Loan, StoreError> {
        let mut state = self.write(Some(WriteStage::Loan))?;

        if !state
            .customers
            .iter()
            .any(|c| c.customer_id == loan.customer_id)
        {
            return Err(StoreError::query(format!(
                "customer {} does not exist",
                loan.customer_id
            )));
        }

        let row = Loan {
            id: Uuid::new_v4(),
            customer_id: loan.customer_id,
            loan_type: loan.loan_type.as_str().to_string(),
            amount_cents: loan.amount_cents,
            term_months: loan.term_months,
            existing_debt_cents: loan.existing_debt_cents,
            monthly_income_cents: loan.monthly_income_cents,
            status: LoanStatus::Pending.as_str().to_string(),
            applied_at: Utc::now(),
        };
        state.loans.push(row.clone());

        Ok(row)
    }

    async fn create_evaluation(
        &self,
        loan_id: Uuid,
        evaluation: &NewEvaluation,
    ) -> Result<LoanEvaluation, StoreError> {
        let mut state = self.write(Some(WriteStage::Evaluation))?;

        if state.loan(loan_id).is_none() {
            return Err(StoreError::query(format!("loan {} does not exist", loan_id)));
        }

        let row = LoanEvaluation {
            id: Uuid::new_v4(),
            loan_id,
            predicted_class: evaluation.predicted_class.clone(),
            risk_level: evaluation.risk_level.clone(),
            monthly_payment: evaluation.monthly_payment,
            dti: evaluation.dti,
            decision: evaluation.decision.clone(),
            evaluated_at: Utc::now(),
        };
        state.evaluations.push(row.clone());

        Ok(row)
    }

    async fn set_loan_status(&self, loan_id: Uuid, status: LoanStatus) -> Result<(), StoreError> {
        let mut state = self.write(Some(WriteStage::Status))?;

        let loan = state
            .loans
            .iter_mut()
            .find(|l| l.id == loan_id)
            .ok_or_else(|| StoreError::query(format!("loan {} not found", loan_id)))?;
        loan.status = status.as_str().to_string();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::loan::LoanType;

    fn customer(name: &str) -> Customer {
        Customer {
            customer_id: Uuid::new_v4(),
            dni: "12345678".to_string(),
            card_number: "4000000000000001".to_string(),
            internet_password_hash: "hash".to_string(),
            full_name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
        }
    }

    fn new_loan(customer_id: Uuid) -> NewLoan {
        NewLoan {
            customer_id,
            loan_type: LoanType::Auto,
            amount_cents: 1_500_000,
            term_months: 36,
            existing_debt_cents: 0,
            monthly_income_cents: 400_000,
        }
    }

    fn evaluation(decision: LoanStatus) -> NewEvaluation {
        NewEvaluation {
            predicted_class: "P2".to_string(),
            risk_level: "medio".to_string(),
            monthly_payment: 542.29,
            dti: 0.42,
            decision: decision.as_str().to_string(),
        }
    }

    #[tokio::test]
    async fn created_loan_is_pending_and_listed() {
        let store = InMemoryStore::new();
        let owner = customer("Ana");
        let owner_id = owner.customer_id;
        store.insert_customer(owner);

        let loan = store.create_loan(&new_loan(owner_id)).await.unwrap();
        let loans = store.loans_for(owner_id).await.unwrap();

        assert_eq!(loans.len(), 1);
        assert_eq!(loans[0].id, loan.id);
        assert_eq!(loans[0].status, "Pending");
    }

    #[tokio::test]
    async fn loan_for_unknown_customer_is_rejected() {
        let store = InMemoryStore::new();

        let result = store.create_loan(&new_loan(Uuid::new_v4())).await;

        assert!(matches!(result, Err(StoreError::Query(_))));
    }

    #[tokio::test]
    async fn evaluation_requires_existing_loan() {
        let store = InMemoryStore::new();

        let result = store
            .create_evaluation(Uuid::new_v4(), &evaluation(LoanStatus::Approved))
            .await;

        assert!(matches!(result, Err(StoreError::Query(_))));
    }

    #[tokio::test]
    async fn evaluations_are_scoped_to_the_customer() {
        let store = InMemoryStore::new();
        let ana = customer("Ana");
        let luis = customer("Luis");
        let (ana_id, luis_id) = (ana.customer_id, luis.customer_id);
        store.insert_customer(ana);
        store.insert_customer(luis);

        let loan = store.create_loan(&new_loan(ana_id)).await.unwrap();
        store
            .create_evaluation(loan.id, &evaluation(LoanStatus::Approved))
            .await
            .unwrap();

        let ana_history = store.evaluations_for(ana_id).await.unwrap();
        assert_eq!(ana_history.len(), 1);
        assert_eq!(ana_history[0].loan_id, loan.id);
        assert_eq!(ana_history[0].loan_type, "Auto");
        assert!(store.evaluations_for(luis_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn pending_review_uses_latest_evaluation_only() {
        let store = InMemoryStore::new();
        let owner = customer("Ana");
        let owner_id = owner.customer_id;
        store.insert_customer(owner);

        let reviewed = store.create_loan(&new_loan(owner_id)).await.unwrap();
        store
            .create_evaluation(reviewed.id, &evaluation(LoanStatus::ManualReview))
            .await
            .unwrap();
        store
            .create_evaluation(reviewed.id, &evaluation(LoanStatus::Approved))
            .await
            .unwrap();

        let waiting = store.create_loan(&new_loan(owner_id)).await.unwrap();
        store
            .create_evaluation(waiting.id, &evaluation(LoanStatus::ManualReview))
            .await
            .unwrap();

        let pending = store.pending_review_loans().await.unwrap();

        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].loan_id, waiting.id);
        assert_eq!(pending[0].full_name, "Ana");
    }

    #[tokio::test]
    async fn default_submission_leaves_pending_loan_when_evaluation_fails() {
        let store = InMemoryStore::new();
        let owner = customer("Ana");
        let owner_id = owner.customer_id;
        store.insert_customer(owner);
        store.fail_writes_at(Some(WriteStage::Evaluation));

        let err = store
            .record_application(
                &new_loan(owner_id),
                &evaluation(LoanStatus::Approved),
                LoanStatus::Approved,
            )
            .await
            .unwrap_err();

        assert_eq!(err.stage, WriteStage::Evaluation);
        let loans = store.loans_for(owner_id).await.unwrap();
        assert_eq!(loans.len(), 1);
        assert_eq!(loans[0].status, "Pending");
        assert!(store.evaluations_for(owner_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_call() {
        let store = InMemoryStore::new();
        store.set_available(false);

        assert!(matches!(store.ping().await, Err(StoreError::Unavailable(_))));
        assert!(matches!(
            store.accounts_for(Uuid::new_v4()).await,
            Err(StoreError::Unavailable(_))
        ));
    }
}
