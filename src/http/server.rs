//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router for one service
//! - Wire up middleware (tracing, timeout, request ID)
//! - Serve on a bound listener until shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{any, get},
    Router,
};
use opentelemetry_sdk::trace::Tracer;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::authorization::{authorization_handler, AuthorizationClient, AuthorizationService};
use crate::config::{ServiceConfig, ServiceKind};
use crate::observability::telemetry::Telemetry;
use crate::payment::{payment_handler, PaymentPipeline};
use crate::validation::{ProductValidator, UserValidator};

/// HTTP server for one of the two services.
pub struct HttpServer {
    kind: ServiceKind,
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Server for `POST /payment`.
    pub fn payment(
        config: ServiceConfig,
        telemetry: Arc<dyn Telemetry>,
        tracer: Tracer,
    ) -> Result<Self, reqwest::Error> {
        let client = AuthorizationClient::new(
            &config.authorization.base_url,
            config.authorization.timeout(),
        )?;
        let pipeline = Arc::new(PaymentPipeline::new(
            telemetry,
            tracer,
            ProductValidator::new(config.validation.product_delay()),
            client,
        ));

        let routes = Router::new()
            .route("/payment", any(payment_handler))
            .with_state(pipeline);

        Ok(Self::from_routes(ServiceKind::Payment, config, routes))
    }

    /// Server for `POST /authorization`.
    pub fn authorization(config: ServiceConfig, telemetry: Arc<dyn Telemetry>, tracer: Tracer) -> Self {
        let service = Arc::new(AuthorizationService::new(
            telemetry,
            tracer,
            UserValidator::new(
                config.authorization.recognized_user_id.clone(),
                config.validation.user_delay(),
            ),
        ));

        let routes = Router::new()
            .route("/authorization", any(authorization_handler))
            .with_state(service);

        Self::from_routes(ServiceKind::Authorization, config, routes)
    }

    fn from_routes(kind: ServiceKind, config: ServiceConfig, routes: Router) -> Self {
        let router = Self::build_router(&config, routes);
        Self {
            kind,
            router,
            config,
        }
    }

    /// Add the shared routes and middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, routes: Router) -> Router {
        routes.route("/health", get(health)).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.timeouts.request_secs,
                )))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
    }

    /// Run the server until a shutdown signal is broadcast.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            service = %self.config.service_name(self.kind),
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

async fn health() -> &'static str {
    "ok"
}
