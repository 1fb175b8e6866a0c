use std::borrow::Cow;
use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hoshidori_core::csv_import::CsvImportError;
use hoshidori_core::error::CoreError;
use hoshidori_mail::EmailError;
use serde_json::json;
use validator::{ValidationError, ValidationErrors};

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `hoshidori_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Field-level input errors, rendered under `fields`.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Outgoing mail could not be built or delivered.
    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    /// The JSON body could not be read into the expected shape.
    #[error("Invalid body: {field}: {message}")]
    InvalidBody { field: String, message: String },

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// A validation error attached to a single field.
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(
            field,
            ValidationError::new("invalid").with_message(Cow::Owned(message.into())),
        );
        AppError::Validation(errors)
    }
}

impl From<CsvImportError> for AppError {
    fn from(err: CsvImportError) -> Self {
        match err {
            CsvImportError::Csv(_) | CsvImportError::UnknownResource(_) => {
                AppError::BadRequest(err.to_string())
            }
            CsvImportError::Utf8(_) | CsvImportError::Flush(_) => {
                AppError::InternalError(err.to_string())
            }
        }
    }
}

/// Key used for body errors that cannot be attributed to a field.
const NON_FIELD_ERRORS: &str = "non_field_errors";

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let (field, message) = match &rejection {
            JsonRejection::JsonDataError(err) => body_error(&err.body_text()),
            other => (NON_FIELD_ERRORS.to_string(), other.body_text()),
        };
        AppError::InvalidBody { field, message }
    }
}

/// Split a serde deserialization message into the offending top-level field
/// and a readable message.
///
/// serde reports `missing field `x``, and prefixes type errors with the path
/// of the bad value (`rating: invalid type: ...`, `tags[0]: ...`).
fn body_error(text: &str) -> (String, String) {
    let detail = text
        .split_once("target type: ")
        .map_or(text, |(_, detail)| detail);
    let detail = match detail.rfind(" at line ") {
        Some(at) => &detail[..at],
        None => detail,
    };

    if let Some(rest) = detail.strip_prefix("missing field `") {
        if let Some((field, _)) = rest.split_once('`') {
            return (field.to_string(), "This field is required.".to_string());
        }
    }

    if let Some((path, reason)) = detail.split_once(": ") {
        if !path.is_empty() && !path.contains(' ') {
            let field = path.split(['.', '[']).next().unwrap_or(path);
            return (field.to_string(), sentence(reason));
        }
    }

    (NON_FIELD_ERRORS.to_string(), sentence(detail))
}

/// Capitalize and terminate a serde message.
fn sentence(text: &str) -> String {
    let mut chars = text.chars();
    let mut out: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => return "Invalid request body.".to_string(),
    };
    if !out.ends_with('.') {
        out.push('.');
    }
    out
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- HTTP-specific errors ---
            AppError::Validation(_) | AppError::InvalidBody { .. } => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Validation failed".to_string(),
            ),
            AppError::Email(err) => {
                tracing::error!(error = %err, "Email delivery failed");
                internal()
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        match &self {
            AppError::Validation(errors) => body["fields"] = json!(field_messages(errors)),
            AppError::InvalidBody { field, message } => {
                body["fields"] = json!(BTreeMap::from([(field, [message])]));
            }
            _ => {}
        }

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

/// Flatten `validator` output into `{field: [messages]}`.
fn field_messages(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| (field.to_string(), errs.iter().map(describe).collect()))
        .collect()
}

fn describe(error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }
    match error.code.as_ref() {
        "length" => match (error.params.get("max"), error.params.get("min")) {
            (Some(max), _) => format!("Ensure this field has no more than {max} characters."),
            (None, Some(min)) => format!("Ensure this field has at least {min} characters."),
            (None, None) => "Invalid length.".to_string(),
        },
        "range" => "Value is out of range.".to_string(),
        "email" => "Enter a valid email address.".to_string(),
        "url" => "Enter a valid URL.".to_string(),
        other => format!("Invalid value ({other})."),
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Foreign key violations map to 400.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            let constraint = db_err.constraint().unwrap_or("unknown");
            match db_err.code().as_deref() {
                // PostgreSQL unique constraint violation.
                Some("23505") if constraint.starts_with("uq_") => {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
                // Foreign key violation: the request referenced a missing row.
                Some("23503") => {
                    return (
                        StatusCode::BAD_REQUEST,
                        "BAD_REQUEST",
                        format!("Referenced row does not exist: {constraint}"),
                    );
                }
                _ => {}
            }
            tracing::error!(error = %db_err, "Database error");
            internal()
        }
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use http_body_util::BodyExt;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(max = 3))]
        name: String,
    }

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn field_error_lists_message_under_field() {
        let (status, json) = body_of(AppError::field("work_id", "Work 9 does not exist.")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["fields"]["work_id"][0], "Work 9 does not exist.");
    }

    #[tokio::test]
    async fn derived_length_error_gets_a_readable_message() {
        let errors = Sample {
            name: "Hamlet".into(),
        }
        .validate()
        .unwrap_err();
        let (_, json) = body_of(errors.into()).await;
        assert_eq!(
            json["fields"]["name"][0],
            "Ensure this field has no more than 3 characters."
        );
    }

    #[test]
    fn missing_field_is_keyed_by_name() {
        let (field, message) = body_error(
            "Failed to deserialize the JSON body into the target type: \
             missing field `rating` at line 1 column 2",
        );
        assert_eq!(field, "rating");
        assert_eq!(message, "This field is required.");
    }

    #[test]
    fn type_error_is_keyed_by_top_level_path() {
        let (field, message) = body_error(
            "Failed to deserialize the JSON body into the target type: \
             tags[1]: invalid type: integer `3`, expected a string at line 1 column 14",
        );
        assert_eq!(field, "tags");
        assert_eq!(message, "Invalid type: integer `3`, expected a string.");
    }

    #[test]
    fn unattributed_error_uses_non_field_key() {
        let (field, message) = body_error(
            "Failed to deserialize the JSON body into the target type: \
             invalid type: sequence, expected struct RateWork at line 1 column 0",
        );
        assert_eq!(field, NON_FIELD_ERRORS);
        assert_eq!(message, "Invalid type: sequence, expected struct RateWork.");
    }

    #[tokio::test]
    async fn invalid_body_renders_field_errors() {
        let err = AppError::InvalidBody {
            field: "title".into(),
            message: "This field is required.".into(),
        };
        let (status, json) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["fields"]["title"][0], "This field is required.");
    }

    #[tokio::test]
    async fn not_found_maps_to_404() {
        let err = AppError::Core(CoreError::NotFound {
            entity: "Work",
            id: 7,
        });
        let (status, json) = body_of(err).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Work with id 7 not found");
    }

    #[tokio::test]
    async fn internal_details_are_not_leaked() {
        let (status, json) = body_of(AppError::InternalError("disk on fire".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "An internal error occurred");
    }
}
