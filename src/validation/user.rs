//! User validation against the user directory.

use std::time::Duration;

use crate::validation::error::{ValidationError, ValidationOutcome};
use crate::validation::{DEFAULT_USER_LOOKUP_DELAY, RECOGNIZED_USER_ID};

#[derive(Debug, Clone)]
pub struct UserValidator {
    recognized_user_id: String,
    delay: Duration,
}

impl UserValidator {
    pub fn new(recognized_user_id: impl Into<String>, delay: Duration) -> Self {
        Self {
            recognized_user_id: recognized_user_id.into(),
            delay,
        }
    }

    pub async fn validate(&self, user_id: &str) -> ValidationOutcome {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if user_id.is_empty() || user_id != self.recognized_user_id {
            return Err(ValidationError::InvalidUser);
        }

        Ok(())
    }
}

impl Default for UserValidator {
    fn default() -> Self {
        Self::new(RECOGNIZED_USER_ID, DEFAULT_USER_LOOKUP_DELAY)
    }
}
