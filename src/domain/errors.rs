//! Domain Errors
//!
//! Failures reported by the outbound ports and by request validation.
//! None of them is fatal: each one ends a single request.

use thiserror::Error;

/// Failure talking to the key-value store.
///
/// A missing key is not an error; ports report it as `None`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Connection or protocol failure reported by the store client
    #[error("store unavailable: {0}")]
    Backend(String),
    /// The key holds a value of another kind (list vs hash vs string)
    #[error("wrong kind of value at key {0}")]
    WrongType(String),
    /// A stored element could not be decoded
    #[error("corrupt value at key {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Failure reaching or decoding the upstream lookup service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    /// No request URL can be built for the address
    #[error("cannot build lookup URL: {0}")]
    Url(String),
    /// The request could not be sent or the connection failed
    #[error("lookup request failed: {0}")]
    Transport(String),
    /// The response body could not be read in full
    #[error("failed to read lookup response: {0}")]
    Body(String),
    /// The body is not a lookup record
    #[error("failed to decode lookup response (status {status}): {reason}")]
    Decode { status: u16, reason: String },
}

/// Malformed inbound request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid input JSON")]
    InvalidJson(String),
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("invalid pagination: {0}")]
    InvalidPagination(String),
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Backend("connection refused".to_string());
        assert_eq!(err.to_string(), "store unavailable: connection refused");

        let err = StoreError::Corrupt {
            key: "posts".to_string(),
            reason: "expected value".to_string(),
        };
        assert!(err.to_string().contains("posts"));
    }

    #[test]
    fn test_upstream_error_display() {
        let err = UpstreamError::Decode {
            status: 502,
            reason: "EOF".to_string(),
        };
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn test_validation_error_display() {
        assert_eq!(
            ValidationError::InvalidJson("trailing comma".to_string()).to_string(),
            "Invalid input JSON"
        );
        assert_eq!(
            ValidationError::MissingField("User ID").to_string(),
            "User ID is required"
        );
    }
}
