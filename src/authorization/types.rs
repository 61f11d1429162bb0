//! Authorization wire types and errors.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body of `POST /authorization`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRequest {
    pub user_id: String,
}

impl AuthorizationRequest {
    // Only the authorization client builds requests.
    pub(crate) fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Success body of `POST /authorization`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    pub token: String,
}

/// A successful authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationGrant {
    /// Opaque; the payment pipeline neither forwards nor stores it.
    pub token: String,
}

/// Why an authorization call did not succeed.
#[derive(Debug, Error)]
pub enum AuthorizationError {
    /// Connect failure, timeout or unreadable response.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The authorization service answered with a non-success status.
    #[error("error authorizing user")]
    Rejected { status: StatusCode },
}

impl AuthorizationError {
    /// Fixed category, safe to use as a metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthorizationError::Transport(_) => "transport",
            AuthorizationError::Rejected { .. } => "rejected",
        }
    }
}
