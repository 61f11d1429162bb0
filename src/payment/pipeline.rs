//! `POST /payment` handler.
//!
//! ```text
//! Received → Decoded → ProductValidated → Authorized → MetricRecorded → Responded
//! ```
//! Any failure jumps straight to Responded after one `error-payment`
//! increment. A request cancelled before responding (client gone, request
//! deadline) also counts one `error-payment` and closes its open spans with an
//! error status. Steps within a request run strictly in order; the
//! product-validation span ends before the authorization call starts.

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

use crate::authorization::AuthorizationClient;
use crate::http::request::{decode_body, request_id};
use crate::http::response::ApiError;
use crate::observability::metrics::{ERROR_PAYMENT, INIT_PAYMENT, TPV};
use crate::observability::telemetry::{CancellationGuard, Telemetry};
use crate::observability::tracing::RequestContext;
use crate::payment::types::{PaymentRequest, PaymentResponse, AUTHORIZATION_FAILED};
use crate::validation::ProductValidator;

/// `error-payment` label for an undecodable body.
pub const DECODE_FAILED: &str = "decode";

pub struct PaymentPipeline {
    telemetry: Arc<dyn Telemetry>,
    tracer: Tracer,
    products: ProductValidator,
    authorization: AuthorizationClient,
}

impl PaymentPipeline {
    pub fn new(
        telemetry: Arc<dyn Telemetry>,
        tracer: Tracer,
        products: ProductValidator,
        authorization: AuthorizationClient,
    ) -> Self {
        Self {
            telemetry,
            tracer,
            products,
            authorization,
        }
    }

    pub async fn handle(&self, method: Method, headers: HeaderMap, body: Bytes) -> Response {
        let root = RequestContext::from_headers(self.tracer.clone(), self.telemetry.clone(), &headers);
        let handler_span = root.start_span_with_kind("handler-payment", SpanKind::Server);
        let ctx = root.with_span(&handler_span);

        ctx.add_counter(INIT_PAYMENT, 1, &[]);
        let pending = CancellationGuard::new(self.telemetry.clone(), ERROR_PAYMENT);

        if method != Method::POST {
            pending.disarm();
            handler_span.set_error("method not allowed");
            handler_span.end();
            return ApiError::MethodNotAllowed.into_response();
        }

        let response = match self.process(&ctx, &headers, &body).await {
            Ok(()) => {
                handler_span.set_ok("payment made");
                (StatusCode::OK, Json(PaymentResponse::success())).into_response()
            }
            Err(e) => {
                handler_span.set_error(e.to_string());
                e.into_response()
            }
        };
        pending.disarm();
        handler_span.end();
        response
    }

    async fn process(
        &self,
        ctx: &RequestContext,
        headers: &HeaderMap,
        body: &Bytes,
    ) -> Result<(), ApiError> {
        let request: PaymentRequest = match decode_body(body) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(request_id = %request_id(headers), error = %e, "Undecodable payment request");
                ctx.add_counter(ERROR_PAYMENT, 1, &[("error", DECODE_FAILED.to_string())]);
                return Err(ApiError::InvalidFields);
            }
        };

        let span = ctx.start_span("product-validation");
        span.set_attribute("productId", request.product_id.clone());
        if let Err(reason) = self.products.validate(&request.product_id, request.amount).await {
            ctx.add_counter(ERROR_PAYMENT, 1, &[("error", reason.to_string())]);
            span.set_error("error when validating product");
            span.end();
            tracing::info!(
                request_id = %request_id(headers),
                product_id = %request.product_id,
                reason = %reason,
                "Product rejected"
            );
            return Err(ApiError::Unauthorized(reason.to_string()));
        }
        span.set_ok("product successfully validated");
        span.end();

        if let Err(e) = self.authorization.authorize(ctx, &request.user_id).await {
            // The cause stays in the log and on the authorization-call span.
            ctx.add_counter(ERROR_PAYMENT, 1, &[("error", e.kind().to_string())]);
            tracing::info!(
                request_id = %request_id(headers),
                user_id = %request.user_id,
                reason = %e,
                "Payment not authorized"
            );
            return Err(ApiError::Unauthorized(AUTHORIZATION_FAILED.to_string()));
        }

        ctx.add_float_counter(TPV, request.amount, &[("productId", request.product_id.clone())]);
        tracing::debug!(
            request_id = %request_id(headers),
            product_id = %request.product_id,
            amount = request.amount,
            "Payment made"
        );

        Ok(())
    }
}

pub async fn payment_handler(
    State(pipeline): State<Arc<PaymentPipeline>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    pipeline.handle(method, headers, body).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::memory::MemoryTelemetry;
    use crate::observability::tracing::{test_tracer, CANCELLED};
    use opentelemetry::trace::Status;
    use opentelemetry_sdk::export::trace::SpanData;
    use opentelemetry_sdk::testing::trace::InMemorySpanExporter;
    use opentelemetry_sdk::trace::TracerProvider;
    use std::time::Duration;

    struct Harness {
        pipeline: PaymentPipeline,
        telemetry: Arc<MemoryTelemetry>,
        exporter: InMemorySpanExporter,
        _provider: TracerProvider,
    }

    impl Harness {
        // The authorization target is never reached in these cases.
        fn new(product_delay: Duration) -> Self {
            let telemetry = Arc::new(MemoryTelemetry::new());
            let (tracer, provider, exporter) = test_tracer();
            let client =
                AuthorizationClient::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
            Self {
                pipeline: PaymentPipeline::new(
                    telemetry.clone(),
                    tracer,
                    ProductValidator::new(product_delay),
                    client,
                ),
                telemetry,
                exporter,
                _provider: provider,
            }
        }

        fn spans_named(&self, name: &str) -> Vec<SpanData> {
            self.exporter
                .get_finished_spans()
                .unwrap()
                .into_iter()
                .filter(|span| span.name == name)
                .collect()
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_non_post_rejected_after_counting() {
        let h = Harness::new(Duration::ZERO);
        let response = h.pipeline.handle(Method::PUT, HeaderMap::new(), Bytes::new()).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(h.telemetry.counter_total(INIT_PAYMENT), 1.0);
        assert_eq!(h.telemetry.counter_total(ERROR_PAYMENT), 0.0);
    }

    #[tokio::test]
    async fn test_missing_field() {
        let h = Harness::new(Duration::ZERO);
        let response = h
            .pipeline
            .handle(Method::POST, HeaderMap::new(), Bytes::from_static(br#"{"productId":"123","amount":12}"#))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Missing or invalid fields");
        assert_eq!(
            h.telemetry.counter_value(ERROR_PAYMENT, &[("error", DECODE_FAILED)]),
            1.0
        );
        assert!(h.spans_named("product-validation").is_empty());
    }

    #[tokio::test]
    async fn test_invalid_amount_reason_is_surfaced() {
        let h = Harness::new(Duration::ZERO);
        let response = h
            .pipeline
            .handle(
                Method::POST,
                HeaderMap::new(),
                Bytes::from_static(br#"{"productId":"123","amount":0,"userId":"123"}"#),
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await["error"],
            "amount must be positive and greater than zero"
        );
        assert_eq!(
            h.telemetry.counter_value(
                ERROR_PAYMENT,
                &[("error", "amount must be positive and greater than zero")]
            ),
            1.0
        );

        let span = &h.spans_named("product-validation")[0];
        assert_eq!(span.status, Status::error("error when validating product"));
        assert!(h.spans_named("authorization-call").is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_authorization_is_generic_401() {
        let h = Harness::new(Duration::ZERO);
        let response = h
            .pipeline
            .handle(
                Method::POST,
                HeaderMap::new(),
                Bytes::from_static(br#"{"productId":"123","amount":12,"userId":"123"}"#),
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], AUTHORIZATION_FAILED);
        assert_eq!(
            h.telemetry.counter_value(ERROR_PAYMENT, &[("error", "transport")]),
            1.0
        );
        assert_eq!(h.telemetry.counter_total(TPV), 0.0);
    }

    #[tokio::test]
    async fn test_cancelled_request_counts_error_and_closes_spans() {
        let h = Harness::new(Duration::from_secs(5));
        let request = h.pipeline.handle(
            Method::POST,
            HeaderMap::new(),
            Bytes::from_static(br#"{"productId":"123","amount":12,"userId":"123"}"#),
        );

        assert!(tokio::time::timeout(Duration::from_millis(50), request).await.is_err());

        assert_eq!(
            h.telemetry.counter_value(ERROR_PAYMENT, &[("error", "cancelled")]),
            1.0
        );
        assert_eq!(h.telemetry.counter_total(ERROR_PAYMENT), 1.0);
        for name in ["product-validation", "handler-payment"] {
            let spans = h.spans_named(name);
            assert_eq!(spans.len(), 1, "{name}");
            assert_eq!(spans[0].status, Status::error(CANCELLED), "{name}");
        }
    }
}
