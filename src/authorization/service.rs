//! `POST /authorization` handler.
//!
//! ```text
//! Received → Decoded → Validated → Responded
//! ```
//! Every branch is terminal. `init-auth` is counted for every request,
//! `error-auth` once per failed one, including requests cancelled before a
//! response was produced.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use opentelemetry::trace::SpanKind;
use opentelemetry_sdk::trace::Tracer;

use crate::authorization::token::issue_token;
use crate::authorization::types::{AuthorizationRequest, TokenResponse};
use crate::http::request::{decode_body, request_id};
use crate::http::response::ApiError;
use crate::observability::metrics::{ERROR_AUTH, INIT_AUTH};
use crate::observability::telemetry::{CancellationGuard, Telemetry};
use crate::observability::tracing::RequestContext;
use crate::validation::UserValidator;

pub struct AuthorizationService {
    telemetry: Arc<dyn Telemetry>,
    tracer: Tracer,
    users: UserValidator,
}

impl AuthorizationService {
    pub fn new(telemetry: Arc<dyn Telemetry>, tracer: Tracer, users: UserValidator) -> Self {
        Self {
            telemetry,
            tracer,
            users,
        }
    }

    pub async fn handle(&self, method: Method, headers: HeaderMap, body: Bytes) -> Response {
        let root = RequestContext::from_headers(self.tracer.clone(), self.telemetry.clone(), &headers);
        let handler_span = root.start_span_with_kind("handler-authorization", SpanKind::Server);
        let ctx = root.with_span(&handler_span);

        ctx.add_counter(INIT_AUTH, 1, &[]);
        let pending = CancellationGuard::new(self.telemetry.clone(), ERROR_AUTH);

        if method != Method::POST {
            pending.disarm();
            handler_span.set_error("method not allowed");
            handler_span.end();
            return ApiError::MethodNotAllowed.into_response();
        }

        let response = match self.authorize(&ctx, &headers, &body).await {
            Ok(token) => {
                handler_span.set_ok("token issued");
                (StatusCode::OK, Json(TokenResponse { token })).into_response()
            }
            Err(e) => {
                ctx.add_counter(ERROR_AUTH, 1, &[]);
                handler_span.set_error(e.to_string());
                e.into_response()
            }
        };
        pending.disarm();
        handler_span.end();
        response
    }

    async fn authorize(
        &self,
        ctx: &RequestContext,
        headers: &HeaderMap,
        body: &Bytes,
    ) -> Result<String, ApiError> {
        let request: AuthorizationRequest = decode_body(body).map_err(|e| {
            tracing::debug!(request_id = %request_id(headers), error = %e, "Undecodable authorization request");
            ApiError::InvalidFields
        })?;

        let span = ctx.start_span("user-validation");
        span.set_attribute("userId", request.user_id.clone());

        if let Err(reason) = self.users.validate(&request.user_id).await {
            span.set_error("unauthorized user");
            span.end();
            tracing::info!(
                request_id = %request_id(headers),
                user_id = %request.user_id,
                reason = %reason,
                "User rejected"
            );
            return Err(ApiError::Unauthorized(reason.to_string()));
        }

        span.set_ok("user authorized successfully");
        span.end();

        Ok(issue_token(&request.user_id))
    }
}

pub async fn authorization_handler(
    State(service): State<Arc<AuthorizationService>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    service.handle(method, headers, body).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::memory::MemoryTelemetry;
    use crate::observability::tracing::{test_tracer, CANCELLED, TRACEPARENT};
    use crate::validation::RECOGNIZED_USER_ID;
    use opentelemetry::trace::{SpanId, Status, TraceId};
    use opentelemetry_sdk::export::trace::SpanData;
    use opentelemetry_sdk::testing::trace::InMemorySpanExporter;
    use opentelemetry_sdk::trace::TracerProvider;
    use std::time::Duration;

    struct Harness {
        service: AuthorizationService,
        telemetry: Arc<MemoryTelemetry>,
        exporter: InMemorySpanExporter,
        _provider: TracerProvider,
    }

    impl Harness {
        fn new(delay: Duration) -> Self {
            let telemetry = Arc::new(MemoryTelemetry::new());
            let (tracer, provider, exporter) = test_tracer();
            let users = UserValidator::new(RECOGNIZED_USER_ID, delay);
            Self {
                service: AuthorizationService::new(telemetry.clone(), tracer, users),
                telemetry,
                exporter,
                _provider: provider,
            }
        }

        fn span(&self, name: &str) -> Option<SpanData> {
            self.exporter
                .get_finished_spans()
                .unwrap()
                .into_iter()
                .find(|span| span.name == name)
        }
    }

    fn attribute(span: &SpanData, key: &str) -> Option<String> {
        span.attributes
            .iter()
            .find(|kv| kv.key.as_str() == key)
            .map(|kv| kv.value.as_str().into_owned())
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_recognized_user_gets_token() {
        let h = Harness::new(Duration::ZERO);
        let response = h
            .service
            .handle(Method::POST, HeaderMap::new(), Bytes::from_static(br#"{"userId":"123"}"#))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["token"], issue_token("123"));
        assert_eq!(h.telemetry.counter_total(INIT_AUTH), 1.0);
        assert_eq!(h.telemetry.counter_total(ERROR_AUTH), 0.0);

        let span = h.span("user-validation").unwrap();
        assert_eq!(attribute(&span, "userId").as_deref(), Some("123"));
        assert_eq!(span.status, Status::Ok);
    }

    #[tokio::test]
    async fn test_unknown_user_rejected() {
        let h = Harness::new(Duration::ZERO);
        let response = h
            .service
            .handle(Method::POST, HeaderMap::new(), Bytes::from_static(br#"{"userId":"124"}"#))
            .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "invalid user");
        assert_eq!(h.telemetry.counter_total(ERROR_AUTH), 1.0);

        let span = h.span("user-validation").unwrap();
        assert_eq!(span.status, Status::error("unauthorized user"));
    }

    #[tokio::test]
    async fn test_malformed_body_opens_no_validation_span() {
        let h = Harness::new(Duration::ZERO);
        let response = h
            .service
            .handle(Method::POST, HeaderMap::new(), Bytes::from_static(b"{not json"))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Missing or invalid fields");
        assert_eq!(h.telemetry.counter_total(ERROR_AUTH), 1.0);
        assert!(h.span("user-validation").is_none());
    }

    #[tokio::test]
    async fn test_get_is_counted_then_rejected() {
        let h = Harness::new(Duration::ZERO);
        let response = h.service.handle(Method::GET, HeaderMap::new(), Bytes::new()).await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(h.telemetry.counter_total(INIT_AUTH), 1.0);
        assert_eq!(h.telemetry.counter_total(ERROR_AUTH), 0.0);
    }

    #[tokio::test]
    async fn test_spans_join_the_callers_trace() {
        let h = Harness::new(Duration::ZERO);
        let mut headers = HeaderMap::new();
        headers.insert(
            TRACEPARENT,
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01".parse().unwrap(),
        );

        h.service
            .handle(Method::POST, headers, Bytes::from_static(br#"{"userId":"123"}"#))
            .await;

        let handler = h.span("handler-authorization").unwrap();
        let validation = h.span("user-validation").unwrap();
        assert_eq!(
            handler.span_context.trace_id(),
            TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap()
        );
        assert_eq!(handler.parent_span_id, SpanId::from_hex("00f067aa0ba902b7").unwrap());
        assert_eq!(validation.parent_span_id, handler.span_context.span_id());
    }

    #[tokio::test]
    async fn test_cancelled_request_counts_error_and_closes_spans() {
        let h = Harness::new(Duration::from_secs(5));
        let request = h
            .service
            .handle(Method::POST, HeaderMap::new(), Bytes::from_static(br#"{"userId":"123"}"#));

        assert!(tokio::time::timeout(Duration::from_millis(50), request).await.is_err());

        assert_eq!(
            h.telemetry.counter_value(ERROR_AUTH, &[("error", "cancelled")]),
            1.0
        );
        for name in ["user-validation", "handler-authorization"] {
            assert_eq!(h.span(name).unwrap().status, Status::error(CANCELLED), "{name}");
        }
    }
}
