use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Text-generation call failed or returned unparseable content.
    ///
    /// Terminal for the whole request. Carries the raw model response when
    /// one was received, so parse failures can be diagnosed from the error
    /// body alone.
    #[error("Upstream failure: {message}")]
    Upstream {
        message: String,
        raw_response: Option<String>,
    },

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Upstream failure without a captured response body.
    pub fn upstream(message: impl Into<String>) -> Self {
        AppError::Upstream {
            message: message.into(),
            raw_response: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::Upstream {
                message,
                raw_response,
            } => {
                let body = match raw_response {
                    Some(raw) => json!({ "error": message, "raw_response": raw }),
                    None => json!({ "error": message }),
                };
                (StatusCode::BAD_GATEWAY, body)
            }
            AppError::HttpClient(_) => {
                (StatusCode::BAD_GATEWAY, json!({ "error": self.to_string() }))
            }
            AppError::Database(_) | AppError::Cache(_) | AppError::Io(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": self.to_string() }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
