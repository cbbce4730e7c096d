//! Value Objects - Immutable domain primitives
//!
//! Value objects are identified by their value rather than identity.
//! They are immutable and can be freely shared.

use crate::domain::errors::ValidationError;

/// Cache key for a lookup.
///
/// The caller's own address has no address string, so it is cached under a
/// fixed key and queried without a path suffix. Any other address is used
/// verbatim both as the cache key and as the upstream path segment; it is not
/// validated as an IP address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LookupKey {
    /// The address the request reaches the upstream from
    Own,
    /// An arbitrary caller-supplied address
    Address(String),
}

impl LookupKey {
    /// Store key used for the caller's own address.
    pub const OWN_KEY: &'static str = "myIP";

    /// Build a key from an optional request field.
    ///
    /// A missing or empty address means the caller's own address.
    pub fn from_request(ip: Option<&str>) -> Self {
        match ip {
            Some(ip) if !ip.is_empty() => Self::Address(ip.to_string()),
            _ => Self::Own,
        }
    }

    /// Key under which the record is cached.
    pub fn cache_key(&self) -> &str {
        match self {
            Self::Own => Self::OWN_KEY,
            Self::Address(ip) => ip,
        }
    }

    /// Path segment appended to the upstream URL, if any.
    pub fn query(&self) -> Option<&str> {
        match self {
            Self::Own => None,
            Self::Address(ip) => Some(ip),
        }
    }
}

/// A page of the post feed.
///
/// Pages are 1-based. `count` items per page map to the inclusive list range
/// `(page - 1) * count ..= page * count - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub count: i64,
}

impl PageRequest {
    pub const DEFAULT_PAGE: i64 = 1;
    pub const DEFAULT_COUNT: i64 = 5;

    pub fn new(page: i64, count: i64) -> Result<Self, ValidationError> {
        if page < 1 {
            return Err(ValidationError::InvalidPagination(format!(
                "page must be at least 1, got {}",
                page
            )));
        }
        if count < 1 {
            return Err(ValidationError::InvalidPagination(format!(
                "count must be at least 1, got {}",
                count
            )));
        }
        Ok(Self { page, count })
    }

    /// Parse raw query parameters, falling back to the defaults when absent.
    pub fn parse(page: Option<&str>, count: Option<&str>) -> Result<Self, ValidationError> {
        let page = parse_param("page", page, Self::DEFAULT_PAGE)?;
        let count = parse_param("count", count, Self::DEFAULT_COUNT)?;
        Self::new(page, count)
    }

    /// First list index of the page.
    pub fn start(&self) -> i64 {
        (self.page - 1).saturating_mul(self.count)
    }

    /// Last list index of the page (inclusive).
    pub fn end(&self) -> i64 {
        self.page.saturating_mul(self.count).saturating_sub(1)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: Self::DEFAULT_PAGE,
            count: Self::DEFAULT_COUNT,
        }
    }
}

fn parse_param(name: &str, raw: Option<&str>, default: i64) -> Result<i64, ValidationError> {
    match raw {
        None => Ok(default),
        Some(s) => s.trim().parse().map_err(|_| {
            ValidationError::InvalidPagination(format!("{} must be an integer, got {:?}", name, s))
        }),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_key_from_request() {
        assert_eq!(LookupKey::from_request(None), LookupKey::Own);
        assert_eq!(LookupKey::from_request(Some("")), LookupKey::Own);
        assert_eq!(
            LookupKey::from_request(Some("8.8.8.8")),
            LookupKey::Address("8.8.8.8".to_string())
        );
    }

    #[test]
    fn test_lookup_key_own() {
        let key = LookupKey::Own;
        assert_eq!(key.cache_key(), "myIP");
        assert_eq!(key.query(), None);
    }

    #[test]
    fn test_lookup_key_address_not_validated() {
        let key = LookupKey::from_request(Some("not-an-ip"));
        assert_eq!(key.cache_key(), "not-an-ip");
        assert_eq!(key.query(), Some("not-an-ip"));
    }

    #[test]
    fn test_page_request_default() {
        let page = PageRequest::default();
        assert_eq!(page.start(), 0);
        assert_eq!(page.end(), 4);
    }

    #[test]
    fn test_page_request_ranges() {
        let page = PageRequest::new(3, 10).unwrap();
        assert_eq!(page.start(), 20);
        assert_eq!(page.end(), 29);

        let single = PageRequest::new(1, 1).unwrap();
        assert_eq!(single.start(), 0);
        assert_eq!(single.end(), 0);
    }

    #[test]
    fn test_page_request_parse_defaults() {
        let page = PageRequest::parse(None, None).unwrap();
        assert_eq!(page, PageRequest::default());

        let page = PageRequest::parse(Some("2"), None).unwrap();
        assert_eq!(page.start(), 5);
        assert_eq!(page.end(), 9);
    }

    #[test]
    fn test_page_request_rejects_invalid() {
        assert!(PageRequest::parse(Some("abc"), None).is_err());
        assert!(PageRequest::parse(None, Some("1.5")).is_err());
        assert!(PageRequest::new(0, 5).is_err());
        assert!(PageRequest::new(1, 0).is_err());
        assert!(PageRequest::new(-2, 5).is_err());
    }

    #[test]
    fn test_page_request_large_values_saturate() {
        let page = PageRequest::new(i64::MAX, 2).unwrap();
        assert_eq!(page.end(), i64::MAX - 1);
    }
}
