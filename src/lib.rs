//! Andean Bank online banking service.
//!
//! A customer signs in with national ID, card number and internet password,
//! then reads accounts and transactions and applies for loans. Each loan
//! application is scored by a credit-risk classifier, priced with a French
//! amortization schedule and decided from risk tier and debt-to-income ratio.
//!
//! The binary in `main.rs` wires the PostgreSQL store into [`app::router`];
//! tests wire [`store::memory::InMemoryStore`] instead.

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod session;
pub mod store;
