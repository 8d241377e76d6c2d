//! Customer data models and login request/response types.
//!
//! This module defines:
//! - `Customer`: Database entity holding login identifiers and the secret digest
//! - `CustomerIdentity`: The public identity returned after a successful login
//! - `CustomerProfile`: Optional scoring attributes used to pre-fill loan forms
//! - `LoginRequest` / `LoginResponse`: Login form payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a customer record from the database.
///
/// # Database Table
///
/// Maps to the `customers` table. A customer signs in with three values:
/// national ID (`dni`), card number and a 6-digit internet password. Only the
/// hex SHA-256 digest of the password is stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Customer {
    pub customer_id: Uuid,
    pub dni: String,
    pub card_number: String,

    /// Unsalted hex SHA-256 of the internet password (64 characters)
    pub internet_password_hash: String,

    pub full_name: String,
    pub email: String,
}

impl Customer {
    /// The identity exposed to the rest of the application.
    pub fn identity(&self) -> CustomerIdentity {
        CustomerIdentity {
            customer_id: self.customer_id,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Authenticated customer identity.
///
/// This is what the credential check yields and what a session carries.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize, Deserialize)]
pub struct CustomerIdentity {
    pub customer_id: Uuid,
    pub full_name: String,
    pub email: String,
}

/// Extended scoring attributes from the optional `customer_profiles` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize)]
pub struct CustomerProfile {
    pub customer_id: Uuid,
    pub age: i32,
    pub monthly_income_cents: i64,
    pub credit_score: i32,
    pub months_employed: i32,
    pub updated_at: DateTime<Utc>,
}

/// Login form submission.
///
/// # JSON Example
///
/// ```json
/// {
///   "dni": "45879632",
///   "card_number": "4557880011223344",
///   "password": "123456"
/// }
/// ```
///
/// Missing fields deserialize as empty strings so that the "complete all
/// fields" warning can be raised instead of a JSON parse error.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub dni: String,

    #[serde(default)]
    pub card_number: String,

    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    /// True when all three fields carry a non-blank value.
    pub fn is_complete(&self) -> bool {
        [&self.dni, &self.card_number, &self.password]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

/// Response body for a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests
    pub token: String,

    pub customer: CustomerIdentity,

    /// Greeting shown on the dashboard
    pub message: String,
}
