use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use restx_core::error::CoreError;
use serde_json::{json, Value};

/// Message used for every sanitized 500 response.
const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for library errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses:
/// `{"error": ..., "code": ...}`, plus `"data"` with per-field messages for
/// validation failures.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A library-level error from `restx_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A request body that failed `validator` checks.
    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// A request body that could not be read as JSON of the expected shape.
    #[error(transparent)]
    Json(#[from] JsonRejection),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

/// Status, code, message and optional field errors of an error response.
type ErrorParts = (StatusCode, &'static str, String, Option<Value>);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, data) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => classify_core_error(core),

            // --- Database errors ---
            AppError::Database(err) => {
                let (status, code, message) = classify_sqlx_error(err);
                (status, code, message, None)
            }

            // --- Request body errors ---
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Invalid request data.".to_string(),
                Some(field_errors(errors)),
            ),
            AppError::Json(rejection) => {
                let code = match rejection {
                    JsonRejection::JsonDataError(_) => "VALIDATION_ERROR",
                    _ => "BAD_REQUEST",
                };
                (StatusCode::BAD_REQUEST, code, rejection.body_text(), None)
            }

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None)
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    INTERNAL_MESSAGE.to_string(),
                    None,
                )
            }
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let Some(data) = data {
            body["data"] = data;
        }

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(core: &CoreError) -> ErrorParts {
    match core {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
            None,
        ),
        CoreError::NotFoundMessage(msg) => {
            (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None)
        }
        CoreError::Validation(msg) => {
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
        }
        CoreError::InvalidField { field, source } => (
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            source.to_string(),
            Some(json!({ field.as_str(): [source.to_string()] })),
        ),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone(), None),
        CoreError::ImproperlyConfigured(msg) => {
            tracing::error!(error = %msg, "Improperly configured");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IMPROPERLY_CONFIGURED",
                INTERNAL_MESSAGE.to_string(),
                None,
            )
        }
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                INTERNAL_MESSAGE.to_string(),
                None,
            )
        }
    }
}

/// `{field: [message, ...]}` for every failed field.
///
/// Errors without a message fall back to their code.
fn field_errors(errors: &validator::ValidationErrors) -> Value {
    let fields: BTreeMap<String, Vec<String>> = errors
        .field_errors()
        .iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect();
    json!(fields)
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                INTERNAL_MESSAGE.to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                INTERNAL_MESSAGE.to_string(),
            )
        }
    }
}
