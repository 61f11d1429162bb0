//! Client for the authorization service.
//!
//! # Responsibilities
//! - Build and send the authorization request
//! - Propagate trace context through `traceparent`
//! - Map transport failures and non-success statuses to [`AuthorizationError`]
//!
//! One attempt per call, never retried. The response is consumed or dropped
//! before returning, so the connection goes back to the pool or is closed on
//! every path.

use std::time::Duration;

use axum::http::HeaderMap;
use opentelemetry::trace::SpanKind;

use crate::authorization::types::{
    AuthorizationError, AuthorizationGrant, AuthorizationRequest, TokenResponse,
};
use crate::observability::tracing::RequestContext;

/// Path of the authorization endpoint.
pub const AUTHORIZATION_PATH: &str = "/authorization";

#[derive(Debug, Clone)]
pub struct AuthorizationClient {
    http: reqwest::Client,
    endpoint: String,
}

impl AuthorizationClient {
    /// Create a client for the service at `base_url`, bounding each call by
    /// `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), AUTHORIZATION_PATH),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Ask the authorization service to authorize `user_id`.
    ///
    /// Runs inside an `authorization-call` client span nested under the
    /// context's active span; that span is what the remote side sees as
    /// parent.
    pub async fn authorize(
        &self,
        ctx: &RequestContext,
        user_id: &str,
    ) -> Result<AuthorizationGrant, AuthorizationError> {
        let span = ctx.start_span_with_kind("authorization-call", SpanKind::Client);
        span.set_attribute("userId", user_id.to_string());
        span.set_attribute("http.url", self.endpoint.clone());

        let mut headers = HeaderMap::new();
        ctx.with_span(&span).inject(&mut headers);

        let result = self.send(headers, user_id).await;

        match &result {
            Ok(_) => span.set_ok("user authorized"),
            Err(e) => {
                tracing::debug!(
                    trace_id = %span.span_context().trace_id(),
                    user_id = %user_id,
                    error = %e,
                    "Authorization call failed"
                );
                span.set_error(e.to_string());
            }
        }
        span.end();

        result
    }

    async fn send(
        &self,
        headers: HeaderMap,
        user_id: &str,
    ) -> Result<AuthorizationGrant, AuthorizationError> {
        let request = AuthorizationRequest::new(user_id);

        let response = self
            .http
            .post(&self.endpoint)
            .headers(headers)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthorizationError::Rejected { status });
        }

        let body: TokenResponse = response.json().await?;
        Ok(AuthorizationGrant { token: body.token })
    }
}
