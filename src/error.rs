use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

/// AuthError
///
/// Everything the authenticator and the authorization gate can fail with. The three
/// token kinds map to distinct 401 codes so clients can tell "log in again" apart from
/// "broken client". Both login kinds share one public code; the precise kind is only
/// logged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    ExpiredToken,
    #[error("no account registered for that email")]
    CredentialNotFound,
    #[error("password does not match")]
    PasswordMismatch,
    #[error("failed to sign token: {0}")]
    TokenIssue(String),
    #[error("failed to hash password: {0}")]
    Hashing(String),
}

impl AuthError {
    /// Stable machine-readable code returned in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::InvalidToken => "invalid_token",
            AuthError::ExpiredToken => "expired_token",
            AuthError::CredentialNotFound | AuthError::PasswordMismatch => "invalid_credentials",
            AuthError::TokenIssue(_) | AuthError::Hashing(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::TokenIssue(_) | AuthError::Hashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn public_message(&self) -> String {
        match self {
            AuthError::CredentialNotFound | AuthError::PasswordMismatch => {
                "incorrect email or password".to_string()
            }
            AuthError::TokenIssue(_) | AuthError::Hashing(_) => {
                "internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ErrorBody::new(self.code(), self.public_message()).into_response_with(self.status())
    }
}

/// RepoError
///
/// Failures surfaced by a `Repository` implementation.
#[derive(Debug, Error)]
pub enum RepoError {
    /// A unique constraint rejected the write (duplicate email, for instance).
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// ApiError
///
/// The single rejection type of every handler. Converts itself into a JSON
/// `ErrorBody` with the matching status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("not allowed to act on this resource")]
    Forbidden,
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Conflict(message) => ApiError::Conflict(message),
            RepoError::Database(e) => {
                tracing::error!("repository failure: {:?}", e);
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(status = %rejection.status(), "json body rejected");
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Auth(auth) => return auth.clone().into_response(),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };
        let message = match &self {
            // Store internals never reach the client.
            ApiError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        };
        ErrorBody::new(code, message).into_response_with(status)
    }
}

/// ErrorBody
///
/// JSON shape of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorBody {
    /// Machine-readable code, e.g. `expired_token`.
    #[schema(example = "invalid_token")]
    pub error: String,
    pub message: String,
}

impl ErrorBody {
    fn new(code: &str, message: String) -> Self {
        Self {
            error: code.to_string(),
            message,
        }
    }

    fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}
