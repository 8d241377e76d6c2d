//! HTTP middleware components.
//!
//! Middleware run before route handlers. Here they authenticate requests and
//! short-circuit the ones that are not allowed through.

/// Session and administrative key authentication middleware
pub mod auth;
