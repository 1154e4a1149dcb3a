//! Postgres helpers for restx views.
//!
//! The view layer computes a [`ListQuery`](restx_core::pagination::ListQuery)
//! (ordering, cursor position, offset, limit); [`listing`] renders it onto a
//! `sqlx::QueryBuilder` against an allow-listed set of sort columns.

use sqlx::postgres::PgPoolOptions;

pub mod listing;

pub use listing::{ListingTable, SortColumn};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
