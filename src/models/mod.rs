//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables,
//! plus the request and response bodies built from them.

/// Bank account model
pub mod account;
/// Customer identity and login payloads
pub mod customer;
/// Loan evaluation records
pub mod evaluation;
/// Loan applications and the product catalogue
pub mod loan;
/// Posted transactions
pub mod transaction;
