//! Field adapters converting between wire values and internal values.
//!
//! Each adapter is usable three ways: as a value type with its own serde
//! impls, as a `#[serde(with = "...")]` module, or as a `validator` custom
//! function for request structs.

pub mod choice;
pub mod metadata;
pub mod timestamp;

pub use choice::Choice;
pub use metadata::{validate_metadata, Metadata};
pub use timestamp::TimestampField;
