//! Ordering derived from the `orderby` query parameter.
//!
//! The filter backend lets a view expose a dynamic ordering while keeping
//! the set of sortable fields closed: anything outside the allow-list falls
//! back to the view's default ordering.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::query::QueryParams;

/// Default ordering when nothing else is configured.
pub const DEFAULT_ORDERING: &str = "-created";

/// Default query parameter carrying the requested ordering.
pub const DEFAULT_ORDERBY_KEY: &str = "orderby";

/// A single-field ordering such as `created` or `-created`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ordering {
    field: String,
    descending: bool,
}

impl Ordering {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    /// Parse `field` or `-field`.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let raw = raw.trim();
        let (field, descending) = match raw.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (raw, false),
        };
        if field.is_empty() || field.starts_with('-') {
            return Err(CoreError::Validation(format!("Invalid ordering \"{raw}\"")));
        }
        Ok(Self {
            field: field.to_string(),
            descending,
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn is_descending(&self) -> bool {
        self.descending
    }

    /// The same field in the opposite direction.
    pub fn reversed(&self) -> Self {
        Self {
            field: self.field.clone(),
            descending: !self.descending,
        }
    }
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "-{}", self.field)
        } else {
            f.write_str(&self.field)
        }
    }
}

impl FromStr for Ordering {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ordering::parse(s)
    }
}

/// Maps a raw `orderby` value to an ordering expression.
///
/// Views implement this when the public ordering names differ from the
/// stored field names (for example `newest` to `-created`).
pub trait OrderingMapper: Send + Sync {
    fn ordering_value(&self, raw: &str) -> Option<String>;
}

/// Uses the raw query value as the ordering expression.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityOrdering;

impl OrderingMapper for IdentityOrdering {
    fn ordering_value(&self, raw: &str) -> Option<String> {
        Some(raw.to_string())
    }
}

/// Filter backend settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderingFilter {
    /// Ordering used when the request does not pick a valid one.
    pub default_ordering: String,
    /// Fields a request may order by, without direction prefix.
    pub lookup_fields: Vec<String>,
    /// Query parameter holding the requested ordering.
    pub orderby_key: String,
}

impl Default for OrderingFilter {
    fn default() -> Self {
        Self {
            default_ordering: DEFAULT_ORDERING.to_string(),
            lookup_fields: vec!["created".to_string()],
            orderby_key: DEFAULT_ORDERBY_KEY.to_string(),
        }
    }
}

impl OrderingFilter {
    pub fn new(default_ordering: impl Into<String>, lookup_fields: &[&str]) -> Self {
        Self {
            default_ordering: default_ordering.into(),
            lookup_fields: lookup_fields.iter().map(|f| f.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_orderby_key(mut self, key: impl Into<String>) -> Self {
        self.orderby_key = key.into();
        self
    }

    /// The configured default, parsed.
    pub fn fallback(&self) -> Result<Ordering, CoreError> {
        Ordering::parse(&self.default_ordering).map_err(|_| {
            CoreError::ImproperlyConfigured(format!(
                "Invalid default ordering \"{}\"",
                self.default_ordering
            ))
        })
    }

    /// Resolve the ordering for a request.
    ///
    /// Without a mapper, or without an `orderby` value, the default is used.
    /// A mapped ordering on a field outside the lookup fields is ignored.
    pub fn resolve(
        &self,
        query: &QueryParams,
        mapper: Option<&dyn OrderingMapper>,
    ) -> Result<Ordering, CoreError> {
        let default = self.fallback()?;

        let Some(raw) = query.get(&self.orderby_key).filter(|v| !v.is_empty()) else {
            return Ok(default);
        };
        let Some(mapper) = mapper else {
            return Ok(default);
        };
        let Some(expression) = mapper.ordering_value(raw) else {
            return Ok(default);
        };

        match Ordering::parse(&expression) {
            Ok(ordering) if self.is_allowed(ordering.field()) => Ok(ordering),
            _ => {
                tracing::debug!(
                    requested = raw,
                    fallback = %default,
                    "Ordering not in lookup fields, using default"
                );
                Ok(default)
            }
        }
    }

    fn is_allowed(&self, field: &str) -> bool {
        self.lookup_fields.iter().any(|f| f == field)
    }
}
