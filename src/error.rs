//! Defines the app level error type and how errors are rendered as JSON responses.
//!
//! Every error response uses one of two envelopes:
//! - `{"detail": "<message>"}` for errors described by a single message, and
//! - `{"errors": {"<field>": ["<message>", ...]}}` for field-level validation errors.

use std::{collections::BTreeMap, fmt::Display};

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

/// The message used for every response to an unexpected error.
pub const SERVER_ERROR_MESSAGE: &str = "Server error.";

/// Validation error messages keyed by the name of the field that caused them.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    /// Create an empty set of validation errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set of validation errors containing a single message for `field`.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record `message` against `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    /// Move the messages of `other` into this set.
    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// Whether no errors have been recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The messages recorded against `field`, if any.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Convert into `Ok(())` if empty, otherwise [Error::Validation].
    pub fn into_result(self) -> Result<(), Error> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;

        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }

                write!(f, "{field}: {message}")?;
                first = false;
            }
        }

        Ok(())
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The username and password did not match a registered user.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The request to a protected route did not include a bearer token.
    #[error("the authorization header is missing")]
    MissingCredentials,

    /// The bearer token could not be decoded, has expired, is not an access
    /// token, or refers to a user that no longer exists.
    #[error("the access token is not valid")]
    InvalidToken,

    /// The refresh token could not be decoded, has expired, or is not a
    /// refresh token.
    #[error("the refresh token is invalid or expired")]
    InvalidRefreshToken,

    /// A JSON web token could not be created.
    ///
    /// The error string should only be logged on the server.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// One or more fields in a request were invalid.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// The request body was not valid JSON or did not have the expected shape.
    #[error("JSON parse error - {0}")]
    MalformedJson(String),

    /// The request body was not sent with a JSON content type.
    #[error("unsupported media type \"{0}\"")]
    UnsupportedMediaType(String),

    /// The HTTP method is not supported for the requested path.
    #[error("method \"{0}\" not allowed")]
    MethodNotAllowed(String),

    /// The category name is already used by another category of the same user.
    #[error("a category with this name already exists")]
    DuplicateCategoryName,

    /// The username is already taken by another user.
    #[error("the username already exists in the database")]
    DuplicateUsername,

    /// Tried to delete a category that transactions still refer to.
    #[error("the category is referenced by {0} transaction(s)")]
    CategoryInUse(i64),

    /// The requested resource was not found.
    ///
    /// Resources owned by other users are reported as not found so that
    /// clients cannot learn about other users' records.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Error::Validation(errors)
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                Error::UnsupportedMediaType(String::new())
            }
            rejection => Error::MalformedJson(rejection.body_text()),
        }
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("rejected path parameters: {}", rejection.body_text());
        Error::NotFound
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Validation(errors) => errors_response(StatusCode::BAD_REQUEST, &errors),
            Error::DuplicateCategoryName => errors_response(
                StatusCode::BAD_REQUEST,
                &ValidationErrors::single("name", "A category with this name already exists."),
            ),
            Error::DuplicateUsername => errors_response(
                StatusCode::BAD_REQUEST,
                &ValidationErrors::single("username", "A user with that username already exists."),
            ),
            Error::MalformedJson(message) => detail_response(
                StatusCode::BAD_REQUEST,
                &format!("JSON parse error - {message}"),
            ),
            Error::UnsupportedMediaType(media_type) => detail_response(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                &format!("Unsupported media type \"{media_type}\" in request."),
            ),
            Error::MethodNotAllowed(method) => detail_response(
                StatusCode::METHOD_NOT_ALLOWED,
                &format!("Method \"{method}\" not allowed."),
            ),
            Error::InvalidCredentials => unauthorized_response(
                "No active account found with the given credentials",
            ),
            Error::MissingCredentials => {
                unauthorized_response("Authentication credentials were not provided.")
            }
            Error::InvalidToken => {
                unauthorized_response("Given token not valid for any token type")
            }
            Error::InvalidRefreshToken => unauthorized_response("Token is invalid or expired"),
            Error::NotFound => detail_response(StatusCode::NOT_FOUND, "Not found."),
            Error::CategoryInUse(_) => detail_response(
                StatusCode::CONFLICT,
                "Cannot delete a category that is used by transactions.",
            ),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                server_error_response()
            }
        }
    }
}

/// A response with the body `{"detail": message}`.
pub fn detail_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

/// A response with the body `{"errors": errors}`.
pub fn errors_response(status: StatusCode, errors: &ValidationErrors) -> Response {
    (status, Json(json!({ "errors": errors }))).into_response()
}

/// The generic 500 response that hides the details of unexpected errors.
pub fn server_error_response() -> Response {
    detail_response(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_MESSAGE)
}

fn unauthorized_response(message: &str) -> Response {
    let mut response = detail_response(StatusCode::UNAUTHORIZED, message);
    response.headers_mut().insert(
        WWW_AUTHENTICATE,
        HeaderValue::from_static("Bearer realm=\"api\""),
    );

    response
}

#[cfg(test)]
mod validation_errors_tests {
    use super::ValidationErrors;

    #[test]
    fn collects_messages_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("amount", "A valid number is required.");
        errors.add("date", "This field is required.");
        errors.add("amount", "Another message.");

        assert_eq!(
            errors.get("amount"),
            Some(
                &[
                    "A valid number is required.".to_owned(),
                    "Another message.".to_owned()
                ][..]
            )
        );
        assert_eq!(errors.get("date").map(<[String]>::len), Some(1));
        assert_eq!(errors.get("type"), None);
    }

    #[test]
    fn empty_errors_are_ok() {
        assert_eq!(ValidationErrors::new().into_result(), Ok(()));
    }

    #[test]
    fn serializes_as_plain_map() {
        let errors = ValidationErrors::single("sort", "Invalid sort.");

        let json = serde_json::to_string(&errors).unwrap();

        assert_eq!(json, r#"{"sort":["Invalid sort."]}"#);
    }
}
