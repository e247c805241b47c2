//! Mapping of engine failures onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use derive_more::{Display, From};
use linkword::ErrorKind;
use serde_json::json;
use tracing::{error, warn};

/// Error returned by every handler.
#[derive(Debug, Display, From)]
pub enum ApiError {
    /// An engine operation failed.
    #[display("{}", _0)]
    Engine(linkword::Error),

    /// The blocking worker running an operation panicked or was cancelled.
    #[display("worker failed: {}", _0)]
    #[from(ignore)]
    Worker(String),
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Status code the failure is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Engine(err) => match err.kind() {
                ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
                ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
                ErrorKind::Forbidden => StatusCode::FORBIDDEN,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Engine(err) => {
                if status.is_server_error() {
                    error!(error = %err, "Request failed");
                } else {
                    warn!(status = %status, error = %err, "Request rejected");
                }
                match err.violations() {
                    Some(violations) => json!({
                        "error": err.public_message(),
                        "violations": violations,
                    }),
                    None => json!({ "error": err.public_message() }),
                }
            }
            Self::Worker(message) => {
                error!(error = %message, "Worker failed");
                json!({ "error": ErrorKind::Internal.to_string() })
            }
        };
        (status, Json(body)).into_response()
    }
}
