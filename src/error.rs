//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` shared by the authentication
//! and task services. Every failure a request can hit, from a bad bearer token to an
//! unreachable authentication service, is expressed as one of its variants.
//!
//! `AppError` implements `actix_web::error::ResponseError`, so handlers can return
//! `Result<_, AppError>` and the variant decides the HTTP status. The JSON body is
//! always `{"error": "<message>"}`.
//! `From` implementations for `sqlx::Error`, `validator::ValidationErrors` and
//! `bcrypt::BcryptError` allow the `?` operator throughout the crate.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// Represents all possible errors that can occur within either service.
///
/// All failures are terminal for the request that raised them; nothing in the
/// system retries.
#[derive(Debug)]
pub enum AppError {
    /// A malformed request, such as a verification token of the wrong kind (HTTP 400).
    BadRequest(String),
    /// Missing, malformed, invalid or expired credentials (HTTP 401).
    Unauthorized(String),
    /// The caller is known but not allowed, e.g. the email is not verified yet (HTTP 403).
    Forbidden(String),
    /// The resource does not exist or is owned by someone else (HTTP 404).
    NotFound(String),
    /// A uniqueness constraint was hit, e.g. an email that is already registered.
    /// Surfaced as HTTP 400.
    Conflict(String),
    /// The authentication service could not be reached during identity delegation (HTTP 503).
    ServiceUnavailable(String),
    /// Input failed `validator` rules (HTTP 422).
    ValidationError(String),
    /// Errors from `sqlx` that are not mapped to a more specific variant (HTTP 500).
    DatabaseError(String),
    /// Anything else that went wrong on the server side (HTTP 500).
    InternalServerError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::ServiceUnavailable(msg) => write!(f, "Service Unavailable: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    fn message(&self) -> &str {
        match self {
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::ServiceUnavailable(msg)
            | AppError::ValidationError(msg)
            | AppError::InternalServerError(msg) => msg,
            // Driver details stay in the logs.
            AppError::DatabaseError(_) => "Database error",
        }
    }
}

/// Converts `AppError` variants into `HttpResponse` objects.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::DatabaseError(detail) = self {
            log::error!("database error: {}", detail);
        }
        let mut builder = HttpResponse::build(self.status_code());
        if let AppError::Unauthorized(_) = self {
            builder.insert_header(("WWW-Authenticate", "Bearer"));
        }
        builder.json(json!({
            "error": self.message()
        }))
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` becomes `NotFound` and a unique-constraint violation becomes
/// `Conflict`, so a racing insert surfaces as a conflict instead of an overwrite.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Record already exists".into())
            }
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_responses() {
        let cases = [
            (AppError::BadRequest("bad".into()), 400),
            (AppError::Unauthorized("Invalid token".into()), 401),
            (AppError::Forbidden("Email not verified".into()), 403),
            (AppError::NotFound("Task not found".into()), 404),
            (AppError::Conflict("User already exists".into()), 400),
            (AppError::ServiceUnavailable("auth down".into()), 503),
            (AppError::ValidationError("title".into()), 422),
            (AppError::DatabaseError("pool closed".into()), 500),
            (AppError::InternalServerError("Server error".into()), 500),
        ];

        for (error, expected) in cases {
            let response = error.error_response();
            assert_eq!(response.status(), expected, "unexpected status for {}", error);
        }
    }

    #[test]
    fn test_unauthorized_carries_bearer_challenge() {
        let response = AppError::Unauthorized("Missing token".into()).error_response();
        assert_eq!(
            response.headers().get("WWW-Authenticate").unwrap(),
            "Bearer"
        );
    }

    #[test]
    fn test_database_error_hides_detail() {
        let error = AppError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(error, AppError::DatabaseError(_)));
        assert_eq!(error.message(), "Database error");
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let error = AppError::from(sqlx::Error::RowNotFound);
        assert!(matches!(error, AppError::NotFound(_)));
    }
}
