//! JSON metadata field.
//!
//! Metadata is a free-form JSON object attached to a resource. Keys at every
//! depth are restricted so they stay usable as query lookups.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use utoipa::openapi::schema::{ObjectBuilder, Schema, Type};
use utoipa::openapi::RefOr;

use crate::error::FieldError;

/// Keys must be word characters only.
static METADATA_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("valid regex"));

/// A validated metadata object.
///
/// Deserializing a `Metadata` runs [`validate_metadata`], so a request struct
/// holding `Option<Metadata>` accepts `null` and rejects anything that is not
/// an object with well-formed keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Metadata(Map<String, Value>);

impl Metadata {
    /// Validate an arbitrary JSON value and take it as metadata.
    pub fn from_value(value: Value) -> Result<Self, FieldError> {
        check_value(&value)?;
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(FieldError::InvalidMetadata),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

impl From<Metadata> for Value {
    fn from(metadata: Metadata) -> Self {
        Value::Object(metadata.0)
    }
}

impl<'de> Deserialize<'de> for Metadata {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Metadata::from_value(value).map_err(serde::de::Error::custom)
    }
}

impl utoipa::PartialSchema for Metadata {
    fn schema() -> RefOr<Schema> {
        RefOr::T(Schema::Object(
            ObjectBuilder::new()
                .schema_type(Type::Object)
                .description(Some(
                    "Free-form object. Keys may only contain letters, digits and single underscores.",
                ))
                .build(),
        ))
    }
}

impl utoipa::ToSchema for Metadata {
    fn name() -> Cow<'static, str> {
        Cow::Borrowed("Metadata")
    }
}

/// `#[serde(default, deserialize_with = ...)]` helper for partial updates:
/// an absent field stays `None`, an explicit `null` becomes `Some(None)`.
pub fn deserialize_patch<'de, D>(deserializer: D) -> Result<Option<Option<Metadata>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Metadata>::deserialize(deserializer).map(Some)
}

/// Validate a metadata value for use with `#[validate(custom(function = ...))]`.
///
/// `null` is accepted; any other non-object top-level value is rejected.
pub fn validate_metadata(value: &Value) -> Result<(), validator::ValidationError> {
    if value.is_null() {
        return Ok(());
    }
    check_value(value).map_err(Into::into)
}

fn check_value(value: &Value) -> Result<(), FieldError> {
    match value {
        Value::Object(map) => check_keys(map),
        _ => Err(FieldError::InvalidMetadata),
    }
}

/// Walk every nested object, including objects held in arrays.
fn check_keys(map: &Map<String, Value>) -> Result<(), FieldError> {
    for (key, value) in map {
        if !is_valid_key(key) {
            return Err(FieldError::InvalidMetadataKey(key.clone()));
        }
        check_nested(value)?;
    }
    Ok(())
}

fn check_nested(value: &Value) -> Result<(), FieldError> {
    match value {
        Value::Object(map) => check_keys(map),
        Value::Array(items) => items.iter().try_for_each(check_nested),
        _ => Ok(()),
    }
}

/// A key is valid when it is made of `[a-zA-Z0-9_]` and has no `__`.
pub fn is_valid_key(key: &str) -> bool {
    METADATA_KEY_RE.is_match(key) && !key.contains("__")
}
