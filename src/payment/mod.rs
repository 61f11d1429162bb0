//! Payment pipeline.
//!
//! # Data Flow
//! ```text
//! POST /payment
//!     → decode PaymentRequest
//!     → product-validation span (validation::ProductValidator)
//!     → authorization::AuthorizationClient
//!     → tpv += amount (productId)
//!     → {"message": "payment made successfully"}
//! ```

pub mod pipeline;
pub mod types;

pub use pipeline::{payment_handler, PaymentPipeline};
pub use types::{PaymentRequest, PaymentResponse};
