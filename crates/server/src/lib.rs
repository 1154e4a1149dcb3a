//! Reference server: a Postgres-backed notes resource exposed through the
//! generic views of `restx-api`.

pub mod config;
pub mod notes;
pub mod routes;
