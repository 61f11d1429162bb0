//! Request decoding helpers.
//!
//! Bodies are decoded by hand instead of through the `Json` extractor so a
//! bad body maps to the service's own 400 body, and so the content type
//! header is not required.

use axum::body::Bytes;
use axum::http::HeaderMap;
use serde::de::DeserializeOwned;

/// Header carrying the per-request id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Decode a JSON body. Missing fields and wrong types are errors.
pub fn decode_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, serde_json::Error> {
    serde_json::from_slice(body)
}

/// The request id assigned by the request-id layer, for log correlation.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct UserBody {
        user_id: String,
    }

    #[test]
    fn test_decode_ok() {
        let body: UserBody = decode_body(&Bytes::from_static(br#"{"userId":"123"}"#)).unwrap();
        assert_eq!(body.user_id, "123");
    }

    #[test]
    fn test_decode_failures() {
        let bodies: [&[u8]; 5] = [b"", b"{", b"{}", br#"{"userId":123}"#, b"null"];
        for body in bodies {
            assert!(decode_body::<UserBody>(&Bytes::copy_from_slice(body)).is_err());
        }
    }

    #[test]
    fn test_request_id_fallback() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_id(&headers), "unknown");
        headers.insert(X_REQUEST_ID, "abc".parse().unwrap());
        assert_eq!(request_id(&headers), "abc");
    }
}
