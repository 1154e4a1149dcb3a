//! Framework-independent building blocks for restx APIs.
//!
//! Holds the field adapters, pagination math, the ordering filter and the
//! documentation override table. Nothing here knows about HTTP; the axum
//! layer lives in `restx-api`.

pub mod docs;
pub mod error;
pub mod fields;
pub mod ordering;
pub mod pagination;
pub mod query;
pub mod types;
