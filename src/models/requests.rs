//! Request DTOs for the page cache API
//!
//! Defines the query strings accepted by the page endpoints.

use serde::Deserialize;

use crate::cache::{MAX_CONTENT_SIZE, MAX_URL_LENGTH};

/// Query string naming a page (`?url=...`)
#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    /// The page url used as cache key
    pub url: String,
}

impl PageQuery {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_url(&self.url)
    }
}

/// Query string of PUT /pages (`?url=...&ttl=...`); the body is the content.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertQuery {
    /// The page url used as cache key
    pub url: String,
    /// Absolute expiry in Unix seconds; the server default applies if absent
    #[serde(default)]
    pub ttl: Option<i64>,
}

impl UpsertQuery {
    /// Validates the url and the size of the body that comes with it.
    pub fn validate(&self, content_len: usize) -> Option<String> {
        if let Some(error) = validate_url(&self.url) {
            return Some(error);
        }
        if content_len > MAX_CONTENT_SIZE {
            return Some(format!(
                "Content exceeds maximum size of {} bytes",
                MAX_CONTENT_SIZE
            ));
        }
        None
    }
}

/// Query string of GET /pages/top (`?n=...`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopQuery {
    #[serde(default)]
    pub n: Option<usize>,
}

fn validate_url(url: &str) -> Option<String> {
    if url.is_empty() {
        return Some("Url cannot be empty".to_string());
    }
    if url.len() > MAX_URL_LENGTH {
        return Some(format!(
            "Url exceeds maximum length of {} bytes",
            MAX_URL_LENGTH
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_query_deserialize() {
        let query: UpsertQuery = serde_json::from_str(r#"{"url": "https://a.io"}"#).unwrap();
        assert_eq!(query.url, "https://a.io");
        assert!(query.ttl.is_none());
    }

    #[test]
    fn test_upsert_query_with_ttl() {
        let query: UpsertQuery =
            serde_json::from_str(r#"{"url": "https://a.io", "ttl": 1700000000}"#).unwrap();
        assert_eq!(query.ttl, Some(1_700_000_000));
    }

    #[test]
    fn test_validate_empty_url() {
        let query = PageQuery { url: "".to_string() };
        assert!(query.validate().is_some());
    }

    #[test]
    fn test_validate_long_url() {
        let query = PageQuery {
            url: "x".repeat(MAX_URL_LENGTH + 1),
        };
        assert!(query.validate().is_some());
    }

    #[test]
    fn test_validate_content_too_large() {
        let query = UpsertQuery {
            url: "https://a.io".to_string(),
            ttl: None,
        };
        assert!(query.validate(MAX_CONTENT_SIZE).is_none());
        assert!(query.validate(MAX_CONTENT_SIZE + 1).is_some());
    }
}
