//! Validation failure reasons.

use thiserror::Error;

/// Business rule violations. The display strings are returned to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("productId cannot be an empty string")]
    EmptyProductId,

    #[error("amount must be positive and greater than zero")]
    NonPositiveAmount,

    #[error("invalid user")]
    InvalidUser,
}

/// `Ok(())` when valid, otherwise the violated rule.
pub type ValidationOutcome = Result<(), ValidationError>;
