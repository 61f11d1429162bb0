//! Request validation stage.
//!
//! # Data Flow
//! ```text
//! payment request
//!     → product.rs (product id, amount; simulated inventory check)
//! authorization request
//!     → user.rs (user id; simulated directory lookup)
//! ```
//!
//! Both checks sleep for a configured delay before deciding. The sleep is a
//! tokio timer, so the request task yields and other requests proceed.

pub mod error;
pub mod product;
pub mod user;

use std::time::Duration;

pub use self::error::{ValidationError, ValidationOutcome};
pub use self::product::ProductValidator;
pub use self::user::UserValidator;

/// Latency of the inventory check the product validation stands in for.
pub const DEFAULT_PRODUCT_CHECK_DELAY: Duration = Duration::from_secs(2);

/// Latency of the directory lookup the user validation stands in for.
pub const DEFAULT_USER_LOOKUP_DELAY: Duration = Duration::from_secs(1);

/// The single user id the directory recognizes.
pub const RECOGNIZED_USER_ID: &str = "123";
