/// Errors raised by a single field adapter while converting wire input.
///
/// The `Display` output is the user-facing message placed in validation
/// error responses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("Invalid metadata. Must be a valid object.")]
    InvalidMetadata,

    #[error("Invalid metadata key \"{0}\".")]
    InvalidMetadataKey(String),

    #[error("Incorrect date format, expected ISO 8601.")]
    InvalidDateFormat,

    #[error("\"{0}\" is not a valid choice.")]
    InvalidChoice(String),
}

impl FieldError {
    /// Short machine-readable code, also used as the `validator` error code.
    pub fn code(&self) -> &'static str {
        match self {
            FieldError::InvalidMetadata => "invalid_metadata",
            FieldError::InvalidMetadataKey(_) => "invalid_metadata_key",
            FieldError::InvalidDateFormat => "invalid_date_format",
            FieldError::InvalidChoice(_) => "invalid_choice",
        }
    }
}

impl From<FieldError> for validator::ValidationError {
    fn from(err: FieldError) -> Self {
        validator::ValidationError::new(err.code()).with_message(err.to_string().into())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// A lookup failed for a reason that should surface as a plain 404
    /// message (invalid page, invalid cursor).
    #[error("{0}")]
    NotFoundMessage(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid value for {field}: {source}")]
    InvalidField {
        field: String,
        #[source]
        source: FieldError,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A view or paginator was configured in a way that cannot work.
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Attach a field name to a [`FieldError`].
    pub fn field(field: impl Into<String>, source: FieldError) -> Self {
        CoreError::InvalidField {
            field: field.into(),
            source,
        }
    }
}
