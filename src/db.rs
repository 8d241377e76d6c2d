//! Database connection pool and migration management.
//!
//! This module provides utilities for:
//! - Creating a lazily connecting PostgreSQL connection pool
//! - Running database migrations

use sqlx::{Pool, Postgres};

/// Type alias for PostgreSQL connection pool.
pub type DbPool = Pool<Postgres>;

/// Create a new PostgreSQL connection pool.
///
/// The pool is created lazily: no connection is opened until the first query
/// runs. An unreachable database therefore does not stop the process from
/// starting; each interaction that needs the store reports the failure on its
/// own instead.
///
/// # Arguments
///
/// * `database_url` - PostgreSQL connection string
/// * `max_connections` - Upper bound on pooled connections
///
/// # Errors
///
/// Returns an error if the connection string cannot be parsed.
pub fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(max_connections)
        .connect_lazy(database_url)
}

/// Run database migrations from the `migrations/` directory.
///
/// Migrations are tracked in the `_sqlx_migrations` table, so each file runs
/// only once.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    // The macro embeds migrations at compile time from ./migrations
    sqlx::migrate!("./migrations").run(pool).await
}
