//! Product validation.

use std::time::Duration;

use crate::validation::error::{ValidationError, ValidationOutcome};
use crate::validation::DEFAULT_PRODUCT_CHECK_DELAY;

#[derive(Debug, Clone)]
pub struct ProductValidator {
    delay: Duration,
}

impl ProductValidator {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Check the product id, then the amount.
    ///
    /// Always waits the full delay first, whatever the input.
    pub async fn validate(&self, product_id: &str, amount: f64) -> ValidationOutcome {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if product_id.is_empty() {
            return Err(ValidationError::EmptyProductId);
        }

        // Written so NaN fails too.
        if !(amount > 0.0) {
            return Err(ValidationError::NonPositiveAmount);
        }

        Ok(())
    }
}

impl Default for ProductValidator {
    fn default() -> Self {
        Self::new(DEFAULT_PRODUCT_CHECK_DELAY)
    }
}
