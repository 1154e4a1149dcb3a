/// Primary keys are `BIGSERIAL` / `i64` everywhere.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
