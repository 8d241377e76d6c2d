//! Transaction data models.
//!
//! Transactions are posted by the core-banking system and are append-only from
//! the point of view of this service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A posted transaction joined with the account it belongs to.
///
/// # Database Tables
///
/// Rows come from `transactions` joined to `accounts`, so every record carries
/// the account number and currency needed to display it.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub account_id: Uuid,
    pub account_number: String,

    pub description: Option<String>,

    /// Signed amount in cents: positive for credits, negative for debits
    pub amount_cents: i64,

    /// Account balance right after this posting, in cents
    pub balance_after_cents: i64,

    pub currency: String,
    pub posted_at: DateTime<Utc>,
}
