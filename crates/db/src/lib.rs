//! PostgreSQL persistence for the Grow subsystem.
//!
//! Repositories are zero-sized structs with async associated functions taking
//! a `&PgPool`. Plain CRUD returns `sqlx::Error`; operations that enforce a
//! domain rule return [`RepoError`] and run their check-then-write sequence
//! inside one transaction (row locks or compare-and-swap updates), so two
//! concurrent writers can never both pass a check that only one should.

use canopy_core::error::{CoreError, GrowError};
use sqlx::postgres::PgPoolOptions;

pub mod models;
pub mod repositories;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to verify connectivity.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply all pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}

/// Error from a repository operation that enforces domain rules.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Grow(#[from] GrowError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
