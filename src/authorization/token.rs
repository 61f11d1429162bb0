//! Authorization token issuance.
//!
//! The token is the hex SHA-256 of the user id: deterministic, unsalted and
//! without expiry. It identifies an authorization, it is not a credential.

use sha2::{Digest, Sha256};

pub fn issue_token(user_id: &str) -> String {
    format!("{:x}", Sha256::digest(user_id.as_bytes()))
}
