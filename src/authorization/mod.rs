//! Authorization: the remote service and the client that calls it.
//!
//! # Data Flow
//! ```text
//! payment pipeline
//!     → client.rs (POST /authorization, traceparent header)
//!     → [network]
//!     → service.rs (decode → user-validation span → token.rs)
//!     → {"token": ...} | 400 | 401
//! ```

pub mod client;
pub mod service;
pub mod token;
pub mod types;

pub use client::AuthorizationClient;
pub use service::{authorization_handler, AuthorizationService};
pub use token::issue_token;
pub use types::{AuthorizationError, AuthorizationGrant, AuthorizationRequest, TokenResponse};
