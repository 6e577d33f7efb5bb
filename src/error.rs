use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid id: {0}")]
    InvalidId(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Store operation timed out: {0}")]
    Timeout(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{summary}: {source}")]
    Context {
        summary: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wraps the error with a route-level summary; rendered as a 500.
    pub fn context(self, summary: &'static str) -> Self {
        Error::Context {
            summary,
            source: Box::new(self),
        }
    }

    /// True for backend failures (the store is unreachable, slow or rejected the write).
    pub fn is_store_error(&self) -> bool {
        match self {
            Error::Database(_) | Error::Timeout(_) => true,
            Error::Context { source, .. } => source.is_store_error(),
            _ => false,
        }
    }

    /// The innermost error, skipping route-level context.
    pub fn root(&self) -> &Error {
        match self {
            Error::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, summary, details) = match self {
            Error::Context { summary, source } => {
                (StatusCode::INTERNAL_SERVER_ERROR, summary.to_string(), source.to_string())
            }
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad request".to_string(), msg),
            Error::Validation(err) => (
                StatusCode::BAD_REQUEST,
                "Invalid request body".to_string(),
                err.to_string(),
            ),
            Error::Json(err) => (
                StatusCode::BAD_REQUEST,
                "Invalid request body".to_string(),
                err.to_string(),
            ),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found".to_string(), msg),
            Error::InvalidId(msg) => (StatusCode::BAD_REQUEST, "Invalid id".to_string(), msg),
            Error::Database(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
                err.to_string(),
            ),
            Error::Timeout(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Store timeout".to_string(),
                msg,
            ),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred".to_string(),
                other.to_string(),
            ),
        };

        let body = Json(json!({ "error": summary, "details": details }));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            other => Error::Database(other),
        }
    }
}
