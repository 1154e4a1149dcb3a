//! Enum choice field.
//!
//! A [`Choice`] is a closed set of members, each backed by a scalar value
//! (a string or an integer). On the wire only the value appears; members
//! are recovered by looking the value up in [`Choice::CHOICES`].
//!
//! ```
//! use restx_core::fields::Choice;
//!
//! #[derive(Debug, Clone, Copy, PartialEq)]
//! enum Status {
//!     Pending,
//!     Complete,
//! }
//!
//! impl Choice for Status {
//!     type Value = &'static str;
//!     const CHOICES: &'static [Self] = &[Status::Pending, Status::Complete];
//!
//!     fn value(&self) -> &'static str {
//!         match self {
//!             Status::Pending => "pending",
//!             Status::Complete => "complete",
//!         }
//!     }
//! }
//!
//! assert_eq!(Status::from_value(&"complete"), Ok(Status::Complete));
//! assert!(Status::from_value(&"unknown").is_err());
//! ```

use std::fmt::Display;

use utoipa::openapi::schema::{Object, ObjectBuilder, Type};

use crate::error::FieldError;

/// A closed set of members convertible to and from a scalar value.
pub trait Choice: Sized + Copy + 'static {
    /// The scalar stored and sent on the wire.
    type Value: PartialEq + Display + Copy;

    /// Every member, in declaration order.
    const CHOICES: &'static [Self];

    fn value(&self) -> Self::Value;

    /// Human readable label, used in documentation. Defaults to the value.
    fn label(&self) -> String {
        self.value().to_string()
    }

    fn from_value(value: &Self::Value) -> Result<Self, FieldError> {
        Self::CHOICES
            .iter()
            .copied()
            .find(|choice| choice.value() == *value)
            .ok_or_else(|| FieldError::InvalidChoice(value.to_string()))
    }

    /// Every allowed value, in declaration order.
    fn values() -> Vec<Self::Value> {
        Self::CHOICES.iter().map(Choice::value).collect()
    }
}

/// Scalars that can back a [`Choice`] on the wire.
pub trait ChoiceValue {
    fn to_json(&self) -> serde_json::Value;
}

impl ChoiceValue for &'static str {
    fn to_json(&self) -> serde_json::Value {
        serde_json::Value::String((*self).to_string())
    }
}

macro_rules! integer_choice_value {
    ($($ty:ty),*) => {
        $(
            impl ChoiceValue for $ty {
                fn to_json(&self) -> serde_json::Value {
                    serde_json::Value::from(*self)
                }
            }
        )*
    };
}

integer_choice_value!(i16, i32, i64, u8, u16, u32);

/// Find the member whose value serializes to the given JSON scalar.
pub fn lookup_json<C>(value: &serde_json::Value) -> Result<C, FieldError>
where
    C: Choice,
    C::Value: ChoiceValue,
{
    C::CHOICES
        .iter()
        .copied()
        .find(|choice| choice.value().to_json() == *value)
        .ok_or_else(|| {
            let shown = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            FieldError::InvalidChoice(shown)
        })
}

/// Validate a raw JSON value against a choice set, for
/// `#[validate(custom(function = ...))]` wrappers.
pub fn validate_choice<C>(value: &serde_json::Value) -> Result<(), validator::ValidationError>
where
    C: Choice,
    C::Value: ChoiceValue,
{
    lookup_json::<C>(value).map(|_| ()).map_err(Into::into)
}

/// OpenAPI enum schema listing every value of `C`.
///
/// Use it from a manual `utoipa::PartialSchema` impl on the choice type.
pub fn schema<C>() -> Object
where
    C: Choice,
    C::Value: ChoiceValue,
{
    let values: Vec<serde_json::Value> = C::CHOICES.iter().map(|c| c.value().to_json()).collect();
    let schema_type = if values.iter().all(serde_json::Value::is_string) {
        Type::String
    } else {
        Type::Integer
    };
    let labels: Vec<String> = C::CHOICES
        .iter()
        .map(|c| format!("`{}` ({})", c.value(), c.label()))
        .collect();
    ObjectBuilder::new()
        .schema_type(schema_type)
        .enum_values(Some(values))
        .description(Some(labels.join(", ")))
        .build()
}

/// `#[serde(with = "restx_core::fields::choice::serde_value")]` for fields
/// holding a [`Choice`] member.
pub mod serde_value {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::{lookup_json, Choice, ChoiceValue};

    pub fn serialize<C, S>(choice: &C, serializer: S) -> Result<S::Ok, S::Error>
    where
        C: Choice,
        C::Value: ChoiceValue,
        S: Serializer,
    {
        choice.value().to_json().serialize(serializer)
    }

    pub fn deserialize<'de, C, D>(deserializer: D) -> Result<C, D::Error>
    where
        C: Choice,
        C::Value: ChoiceValue,
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        lookup_json::<C>(&value).map_err(serde::de::Error::custom)
    }

    /// Same conversion for `Option<C>`; `null` maps to `None`.
    pub mod option {
        use serde::{Deserialize, Deserializer, Serialize, Serializer};

        use super::super::{lookup_json, Choice, ChoiceValue};

        pub fn serialize<C, S>(choice: &Option<C>, serializer: S) -> Result<S::Ok, S::Error>
        where
            C: Choice,
            C::Value: ChoiceValue,
            S: Serializer,
        {
            choice
                .as_ref()
                .map(|c| c.value().to_json())
                .serialize(serializer)
        }

        pub fn deserialize<'de, C, D>(deserializer: D) -> Result<Option<C>, D::Error>
        where
            C: Choice,
            C::Value: ChoiceValue,
            D: Deserializer<'de>,
        {
            match serde_json::Value::deserialize(deserializer)? {
                serde_json::Value::Null => Ok(None),
                value => lookup_json::<C>(&value)
                    .map(Some)
                    .map_err(serde::de::Error::custom),
            }
        }
    }
}
