//! Account data models and API response types.
//!
//! This module defines:
//! - `Account`: Database entity representing a customer's bank account
//! - `AccountResponse`: Response body returned to clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents an account record from the database.
///
/// # Database Table
///
/// Maps to the `accounts` table. Each account:
/// - Belongs to exactly one customer (via `customer_id`)
/// - Has a balance stored in cents, tagged with its currency
///
/// Balances are only changed by transaction postings made by an external
/// core-banking system; this service reads them.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Account {
    /// Unique identifier for this account
    pub id: Uuid,

    /// Owning customer
    ///
    /// Every account query filters on this column so a customer only ever
    /// sees their own accounts.
    pub customer_id: Uuid,

    /// Product name, e.g. "Savings" or "Checking"
    pub account_type: String,

    /// Customer-facing account number
    pub account_number: String,

    /// Current balance in cents
    pub balance_cents: i64,

    /// Currency code (ISO 4217, 3 letters), e.g. "PEN" or "USD"
    pub currency: String,

    /// Lifecycle status, e.g. "Active" or "Blocked"
    pub status: String,

    /// When the account was opened
    pub opened_at: DateTime<Utc>,
}

/// Response body for account endpoints.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": "550e8400-e29b-41d4-a716-446655440000",
///   "account_type": "Savings",
///   "account_number": "191-00012345-0-11",
///   "balance_cents": 1250050,
///   "currency": "PEN",
///   "status": "Active",
///   "opened_at": "2024-03-01T10:00:00Z"
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub account_type: String,
    pub account_number: String,
    pub balance_cents: i64,
    pub currency: String,
    pub status: String,
    pub opened_at: DateTime<Utc>,
}

/// Convert database Account to API AccountResponse.
///
/// The owning `customer_id` is implied by the session and is not echoed back.
impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            account_type: account.account_type,
            account_number: account.account_number,
            balance_cents: account.balance_cents,
            currency: account.currency,
            status: account.status,
            opened_at: account.opened_at,
        }
    }
}
