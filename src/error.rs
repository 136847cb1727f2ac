//! Defines the app level error type and its conversion into JSON error responses.

use axum::{
    Json,
    http::{StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::category::CategoryId;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The bearer token was missing, malformed, expired, signed with the wrong
    /// key, or refers to a user that no longer exists.
    ///
    /// The cause is deliberately not part of the error so that it cannot leak
    /// into a response.
    #[error("could not validate credentials")]
    Unauthorized,

    /// The user provided an invalid combination of username and password.
    #[error("incorrect username or password")]
    InvalidCredentials,

    /// The requested resource was not found.
    ///
    /// Resources owned by other users are reported as not found so that
    /// callers cannot learn whether another user's resource exists.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The username is already registered.
    #[error("the username is already taken")]
    DuplicateUsername,

    /// The email address is already registered.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// The category ID used to create or update an expense does not refer to
    /// one of the caller's categories.
    #[error("category {0} does not refer to one of your categories")]
    InvalidCategory(CategoryId),

    /// An empty string was used to create a category name.
    #[error("category name cannot be empty")]
    EmptyCategoryName,

    /// The category name exceeds the maximum length.
    #[error("category name cannot be longer than {0} characters")]
    CategoryNameTooLong(usize),

    /// The username is empty or too long.
    #[error("invalid username: {0}")]
    InvalidUsername(String),

    /// The email address could not be parsed or is too long.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// An empty password was given at registration.
    #[error("password cannot be empty")]
    EmptyPassword,

    /// Amounts are magnitudes, the direction of the money is carried by the
    /// expense type.
    #[error("amount cannot be negative")]
    NegativeAmount,

    /// The amount cannot be stored as a whole number of cents.
    #[error("amount is too large")]
    AmountOutOfRange,

    /// The description exceeds the maximum length.
    #[error("description cannot be longer than {0} characters")]
    DescriptionTooLong(usize),

    /// A transaction date could not be parsed.
    #[error("invalid date \"{0}\", expected an RFC 3339 date-time or YYYY-MM-DD")]
    InvalidDate(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A session token could not be signed.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// A request or response body could not be buffered.
    #[error("could not read body: {0}")]
    BodyReadError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.username") =>
            {
                Error::DuplicateUsername
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthorized | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::DuplicateUsername | Error::DuplicateEmail => StatusCode::CONFLICT,
            Error::InvalidCategory(_) => StatusCode::BAD_REQUEST,
            Error::EmptyCategoryName
            | Error::CategoryNameTooLong(_)
            | Error::InvalidUsername(_)
            | Error::InvalidEmail(_)
            | Error::EmptyPassword
            | Error::NegativeAmount
            | Error::AmountOutOfRange
            | Error::DescriptionTooLong(_)
            | Error::InvalidDate(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::HashingError(_)
            | Error::TokenCreation(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError
            | Error::BodyReadError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Server faults are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "Internal server error".to_owned()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": message,
        }));

        if self == Error::Unauthorized {
            (status, [(WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}
