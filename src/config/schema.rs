//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files. Every
//! section has defaults so an empty file is a valid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::validation::{DEFAULT_PRODUCT_CHECK_DELAY, DEFAULT_USER_LOOKUP_DELAY, RECOGNIZED_USER_ID};

/// Which of the two services a process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Payment,
    Authorization,
}

impl ServiceKind {
    pub fn default_bind_address(self) -> &'static str {
        match self {
            ServiceKind::Payment => "0.0.0.0:8080",
            ServiceKind::Authorization => "0.0.0.0:8081",
        }
    }

    pub fn default_service_name(self) -> &'static str {
        match self {
            ServiceKind::Payment => "payment-api",
            ServiceKind::Authorization => "authorization-api",
        }
    }
}

/// Root configuration shared by both services.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Outbound authorization call (payment service) and user directory
    /// (authorization service).
    pub authorization: AuthorizationConfig,

    /// Simulated downstream latencies.
    pub validation: ValidationConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ServiceConfig {
    /// Effective bind address for a service.
    pub fn bind_address(&self, kind: ServiceKind) -> &str {
        self.listener
            .bind_address
            .as_deref()
            .unwrap_or_else(|| kind.default_bind_address())
    }

    /// Effective service name reported in logs and traces.
    pub fn service_name(&self, kind: ServiceKind) -> &str {
        self.observability
            .service_name
            .as_deref()
            .unwrap_or_else(|| kind.default_service_name())
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080"). Defaults per service.
    pub bind_address: Option<String>,
}

/// Authorization settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthorizationConfig {
    /// Base address of the authorization service.
    pub base_url: String,

    /// Deadline for one authorization call in milliseconds.
    pub timeout_ms: u64,

    /// The user id the directory recognizes.
    pub recognized_user_id: String,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081".to_string(),
            timeout_ms: 5_000,
            recognized_user_id: RECOGNIZED_USER_ID.to_string(),
        }
    }
}

impl AuthorizationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Simulated latencies of the validation stage.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Product (inventory) check delay in milliseconds.
    pub product_delay_ms: u64,

    /// User (directory) lookup delay in milliseconds.
    pub user_delay_ms: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            product_delay_ms: DEFAULT_PRODUCT_CHECK_DELAY.as_millis() as u64,
            user_delay_ms: DEFAULT_USER_LOOKUP_DELAY.as_millis() as u64,
        }
    }
}

impl ValidationConfig {
    /// No simulated latency at all.
    pub fn instant() -> Self {
        Self {
            product_delay_ms: 0,
            user_delay_ms: 0,
        }
    }

    pub fn product_delay(&self) -> Duration {
        Duration::from_millis(self.product_delay_ms)
    }

    pub fn user_delay(&self) -> Duration {
        Duration::from_millis(self.user_delay_ms)
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,

    /// Name reported in logs and as the `service.name` trace resource.
    /// Defaults per service.
    pub service_name: Option<String>,

    /// Export finished spans over OTLP.
    pub traces_enabled: bool,

    /// OTLP/gRPC collector endpoint.
    pub otlp_endpoint: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
            service_name: None,
            traces_enabled: true,
            otlp_endpoint: "http://localhost:4317".to_string(),
        }
    }
}
