//! axum integration for restx.
//!
//! Generic views ([`views`]) turn a small trait impl into enveloped JSON
//! endpoints with pagination, ordering and a request/response serializer
//! pair. [`ApiRouter`] mounts them and records what it mounted so
//! [`schema`] can produce a matching OpenAPI document.

pub mod config;
pub mod error;
pub mod middleware;
pub mod request;
pub mod response;
pub mod schema;
pub mod views;

pub use error::{AppError, AppResult};
pub use views::router::ApiRouter;
