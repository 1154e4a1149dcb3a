//! Timestamp field: datetimes on the wire as scaled epoch integers.
//!
//! The default scale is 1000, so values are epoch milliseconds. Input is
//! accepted either as an integer in the same scale or as a whole-second
//! UTC string (`2024-01-31T12:00:00Z`).

use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;

use crate::error::FieldError;
use crate::types::Timestamp;

/// Scale used when none is configured: epoch milliseconds.
pub const DEFAULT_MULTIPLIER: i64 = 1000;

/// The only string layout accepted on input.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Converts between [`Timestamp`] and a scaled epoch integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampField {
    multiplier: i64,
}

impl Default for TimestampField {
    fn default() -> Self {
        Self::new(DEFAULT_MULTIPLIER)
    }
}

impl TimestampField {
    /// A field with a custom scale. A multiplier of `1` gives epoch seconds.
    ///
    /// Non-positive multipliers are treated as `1`.
    pub const fn new(multiplier: i64) -> Self {
        Self {
            multiplier: if multiplier > 0 { multiplier } else { 1 },
        }
    }

    pub const fn multiplier(&self) -> i64 {
        self.multiplier
    }

    /// `int(timestamp * multiplier)`, truncating toward zero.
    pub fn to_representation(&self, value: &Timestamp) -> i64 {
        let nanos =
            i128::from(value.timestamp()) * NANOS_PER_SEC + i128::from(value.timestamp_subsec_nanos());
        let scaled = nanos * i128::from(self.multiplier) / NANOS_PER_SEC;
        i64::try_from(scaled).unwrap_or(if scaled < 0 { i64::MIN } else { i64::MAX })
    }

    pub fn to_representation_opt(&self, value: Option<&Timestamp>) -> Option<i64> {
        value.map(|v| self.to_representation(v))
    }

    /// Convert a wire value back into a datetime.
    pub fn to_internal_value(&self, value: &Value) -> Result<Timestamp, FieldError> {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => self.from_integer(i),
                None => Err(FieldError::InvalidDateFormat),
            },
            Value::String(s) => parse_date(s),
            _ => Err(FieldError::InvalidDateFormat),
        }
    }

    /// Divide a scaled integer by the multiplier.
    pub fn from_integer(&self, value: i64) -> Result<Timestamp, FieldError> {
        let nanos = i128::from(value) * NANOS_PER_SEC / i128::from(self.multiplier);
        let secs = i64::try_from(nanos.div_euclid(NANOS_PER_SEC))
            .map_err(|_| FieldError::InvalidDateFormat)?;
        // rem_euclid of a positive modulus always fits in u32.
        let subsec = nanos.rem_euclid(NANOS_PER_SEC) as u32;
        DateTime::from_timestamp(secs, subsec).ok_or(FieldError::InvalidDateFormat)
    }
}

/// Parse a `%Y-%m-%dT%H:%M:%SZ` string as UTC.
pub fn parse_date(value: &str) -> Result<Timestamp, FieldError> {
    NaiveDateTime::parse_from_str(value, DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| FieldError::InvalidDateFormat)
}

macro_rules! scaled_serde_module {
    ($name:ident, $multiplier:expr, $doc:literal) => {
        #[doc = $doc]
        pub mod $name {
            use serde::{Deserialize, Deserializer, Serializer};
            use serde_json::Value;

            use super::TimestampField;
            use crate::types::Timestamp;

            const FIELD: TimestampField = TimestampField::new($multiplier);

            pub fn serialize<S: Serializer>(value: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_i64(FIELD.to_representation(value))
            }

            pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
                let value = Value::deserialize(deserializer)?;
                FIELD
                    .to_internal_value(&value)
                    .map_err(serde::de::Error::custom)
            }

            /// Same conversion for `Option<Timestamp>`; `null` maps to `None`.
            pub mod option {
                use serde::{Deserialize, Deserializer, Serializer};
                use serde_json::Value;

                use super::FIELD;
                use crate::types::Timestamp;

                pub fn serialize<S: Serializer>(
                    value: &Option<Timestamp>,
                    serializer: S,
                ) -> Result<S::Ok, S::Error> {
                    match FIELD.to_representation_opt(value.as_ref()) {
                        Some(v) => serializer.serialize_some(&v),
                        None => serializer.serialize_none(),
                    }
                }

                pub fn deserialize<'de, D: Deserializer<'de>>(
                    deserializer: D,
                ) -> Result<Option<Timestamp>, D::Error> {
                    match Value::deserialize(deserializer)? {
                        Value::Null => Ok(None),
                        value => FIELD
                            .to_internal_value(&value)
                            .map(Some)
                            .map_err(serde::de::Error::custom),
                    }
                }
            }
        }
    };
}

scaled_serde_module!(
    millis,
    super::DEFAULT_MULTIPLIER,
    "`#[serde(with = \"restx_core::fields::timestamp::millis\")]` for epoch milliseconds."
);
scaled_serde_module!(
    seconds,
    1,
    "`#[serde(with = \"restx_core::fields::timestamp::seconds\")]` for epoch seconds."
);
