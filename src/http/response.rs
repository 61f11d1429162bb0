//! Response bodies and error mapping.
//!
//! Every handler outcome that is not a success becomes an [`ApiError`];
//! its `IntoResponse` impl owns the status code and body shape.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body of every JSON error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Non-POST request to a POST-only endpoint.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Body did not decode into the expected request.
    #[error("Missing or invalid fields")]
    InvalidFields,

    /// Business rule or authorization failure, with the client-facing reason.
    #[error("{0}")]
    Unauthorized(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::InvalidFields => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            // Plain text, like the default for unsupported methods.
            ApiError::MethodNotAllowed => (status, "Method not allowed").into_response(),
            other => (
                status,
                Json(ErrorBody {
                    error: other.to_string(),
                }),
            )
                .into_response(),
        }
    }
}
