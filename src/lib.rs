//! Payment and authorization services with cross-service tracing.

pub mod authorization;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod payment;
pub mod validation;

pub use config::schema::{ServiceConfig, ServiceKind};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
