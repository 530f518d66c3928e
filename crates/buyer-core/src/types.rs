//! Shared value types used across the buyer workspace.

use crate::error::BuyerError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Newtype for page URLs the flow navigates to.
///
/// Only absolute `http`/`https` URLs are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PageUrl(String);

impl PageUrl {
    /// Create a new `PageUrl` from a string.
    ///
    /// # Errors
    /// Returns error if the URL is not an absolute http(s) URL.
    pub fn new(url: impl Into<String>) -> Result<Self, BuyerError> {
        let url = url.into();
        Self::validate(&url)?;
        Ok(Self(url))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(url: &str) -> Result<(), BuyerError> {
        static URL_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = URL_REGEX
            .get_or_init(|| Regex::new(r"^https?://[^\s/?#]+[^\s]*$").expect("valid regex"));

        if regex.is_match(url) {
            Ok(())
        } else {
            Err(BuyerError::InvalidUrl {
                url: url.to_string(),
                reason: "must be an absolute http(s) URL",
            })
        }
    }
}

impl TryFrom<String> for PageUrl {
    type Error = BuyerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PageUrl> for String {
    fn from(url: PageUrl) -> Self {
        url.0
    }
}

impl fmt::Display for PageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A credential value that never shows up in logs.
///
/// `Debug` and `Display` both print a redacted placeholder.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the raw value, e.g. to type it into a form field.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url_valid() {
        let valid = vec![
            "https://www.example.com",
            "http://localhost:8080/shop",
            "https://shop.example.com/dp/B0CL9BTQRF?psc=1",
        ];

        for url in valid {
            assert!(PageUrl::new(url).is_ok(), "Failed for: {url}");
        }
    }

    #[test]
    fn test_page_url_invalid() {
        let invalid = vec!["", "example.com", "ftp://example.com", "https://", "https://a b"];

        for url in invalid {
            assert!(PageUrl::new(url).is_err(), "Should fail for: {url}");
        }
    }

    #[test]
    fn test_page_url_serde() {
        let url = PageUrl::new("https://www.example.com").expect("valid url");
        let json = serde_json::to_string(&url).expect("serialize url");
        assert_eq!(json, "\"https://www.example.com\"");

        let bad: Result<PageUrl, _> = serde_json::from_str("\"not a url\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_secret_redacted() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{secret:?}"), "Secret(***)");
        assert_eq!(secret.to_string(), "***");
        assert_eq!(secret.expose(), "hunter2");
    }
}
