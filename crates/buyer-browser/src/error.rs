use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrowserError>;

/// Failures of page automation calls.
///
/// Cloneable so a scripted page can hand out the same failure repeatedly.
#[derive(Debug, Clone, Error)]
pub enum BrowserError {
    /// Launch, CDP or element interaction failure
    #[error("chromium error: {0}")]
    Chromium(String),

    /// The page could not be loaded
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Nothing matched the selector (or selector + text)
    #[error("selector not found: {0}")]
    SelectorNotFound(String),

    /// The call did not finish in time
    #[error("timeout: {0}")]
    Timeout(String),

    /// In-page JavaScript failed or returned something unexpected
    #[error("script evaluation failed: {0}")]
    Script(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BrowserError::Navigation("net::ERR_CONNECTION_RESET".to_string());
        assert_eq!(err.to_string(), "navigation failed: net::ERR_CONNECTION_RESET");
    }

    #[test]
    fn test_clone_keeps_message() {
        let err = BrowserError::Timeout("form img".to_string());
        assert_eq!(err.clone().to_string(), "timeout: form img");
    }
}
