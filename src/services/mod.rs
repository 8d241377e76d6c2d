//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They take the store and the risk scorer as explicit arguments.

pub mod credential_service;
pub mod loan_engine;
pub mod loan_service;
pub mod risk_scorer;
