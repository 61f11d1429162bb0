//! Configuration validation.
//!
//! Semantic checks only; serde handles syntax. Every issue is collected
//! rather than stopping at the first.

use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::ServiceConfig;

/// One rejected setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub field: &'static str,
    pub reason: String,
}

impl ConfigIssue {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ConfigIssue>> {
    let mut issues = Vec::new();

    if let Some(addr) = &config.listener.bind_address {
        if addr.parse::<SocketAddr>().is_err() {
            issues.push(ConfigIssue::new(
                "listener.bind_address",
                format!("'{addr}' is not a socket address"),
            ));
        }
    }

    match Url::parse(&config.authorization.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
        Ok(url) => issues.push(ConfigIssue::new(
            "authorization.base_url",
            format!("unsupported address '{url}'"),
        )),
        Err(e) => issues.push(ConfigIssue::new("authorization.base_url", e.to_string())),
    }

    if config.authorization.timeout_ms == 0 {
        issues.push(ConfigIssue::new("authorization.timeout_ms", "must be greater than zero"));
    }

    if config.authorization.recognized_user_id.is_empty() {
        issues.push(ConfigIssue::new("authorization.recognized_user_id", "must not be empty"));
    }

    if config.timeouts.request_secs == 0 {
        issues.push(ConfigIssue::new("timeouts.request_secs", "must be greater than zero"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        issues.push(ConfigIssue::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if config.observability.traces_enabled {
        match Url::parse(&config.observability.otlp_endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
            Ok(url) => issues.push(ConfigIssue::new(
                "observability.otlp_endpoint",
                format!("unsupported address '{url}'"),
            )),
            Err(e) => issues.push(ConfigIssue::new("observability.otlp_endpoint", e.to_string())),
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
