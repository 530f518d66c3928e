//! Error types shared by the buyer crates.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by shared value types.
#[derive(Error, Debug)]
pub enum BuyerError {
    /// A page URL was rejected
    #[error("invalid page URL '{url}': {reason}")]
    InvalidUrl {
        /// Rejected input
        url: String,
        /// What is wrong with it
        reason: &'static str,
    },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// An explicitly requested config file does not exist
    #[error("config file not found at {}", .path.display())]
    NotFound {
        /// Path where config was expected
        path: PathBuf,
    },

    /// File exists but is not a valid config
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        /// File that failed to parse
        path: PathBuf,
        /// TOML error, including the offending key or line
        #[source]
        source: toml::de::Error,
    },

    /// I/O error reading config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value parsed but cannot be used
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Dotted field name, e.g. `ocr.timeout_secs`
        field: &'static str,
        /// Reason for invalidity
        reason: &'static str,
    },
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value_display() {
        let err = ConfigError::InvalidValue {
            field: "ocr.timeout_secs",
            reason: "must be greater than zero",
        };
        assert_eq!(
            err.to_string(),
            "invalid config value for ocr.timeout_secs: must be greater than zero"
        );
    }

    #[test]
    fn test_parse_error_names_file() {
        let source = toml::from_str::<toml::Value>("flow = [").unwrap_err();
        let err = ConfigError::Parse {
            path: PathBuf::from("/etc/buyer/config.toml"),
            source,
        };
        assert!(err.to_string().starts_with("failed to parse /etc/buyer/config.toml"));
    }

    #[test]
    fn test_invalid_url_display() {
        let err = BuyerError::InvalidUrl {
            url: "example.com/dp/B000".to_string(),
            reason: "must be an absolute http(s) URL",
        };
        assert_eq!(
            err.to_string(),
            "invalid page URL 'example.com/dp/B000': must be an absolute http(s) URL"
        );
    }
}
