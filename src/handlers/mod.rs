//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, session context)
//! 2. Calls the store or a service
//! 3. Returns HTTP response (JSON, status code)

/// Administrative queue
pub mod admin;
/// Login and logout
pub mod auth;
/// Account listing
pub mod accounts;
/// Consolidated position and profile
pub mod dashboard;
/// Service health
pub mod health;
/// Loan listing, quoting and submission
pub mod loans;
/// Transaction history
pub mod transactions;
