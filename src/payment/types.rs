//! Payment wire types.

use serde::{Deserialize, Serialize};

/// Body of `POST /payment`. Every field is required.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub product_id: String,
    pub amount: f64,
    pub user_id: String,
}

/// Success body of `POST /payment`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentResponse {
    pub message: String,
}

impl PaymentResponse {
    pub fn success() -> Self {
        Self {
            message: PAYMENT_SUCCEEDED.to_string(),
        }
    }
}

pub const PAYMENT_SUCCEEDED: &str = "payment made successfully";

/// Reason returned for any authorization failure. The specific cause is
/// only recorded in telemetry.
pub const AUTHORIZATION_FAILED: &str = "Could not authorize payment";
