use crate::error::{BrowserError, Result};

/// Browser actions for automation.
///
/// Elements are addressed by CSS selector; when several elements match,
/// the first one in document order is used.
#[async_trait::async_trait]
pub trait BrowserActions: Send + Sync {
    /// Navigate to a URL
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Check whether at least one element matches the selector
    async fn element_exists(&self, selector: &str) -> Result<bool>;

    /// Check whether an element is rendered inside the current viewport
    async fn is_visible(&self, selector: &str) -> Result<bool>;

    /// Scroll an element into the viewport
    async fn scroll_into_view(&self, selector: &str) -> Result<()>;

    /// Take a PNG screenshot clipped to an element's bounding box
    async fn screenshot_element(&self, selector: &str) -> Result<Vec<u8>>;

    /// Replace the value of a form field by selector
    async fn fill_field(&self, selector: &str, value: &str) -> Result<()>;

    /// Click an element by selector
    async fn click(&self, selector: &str) -> Result<()>;

    /// Click the first element matching the selector whose text contains `text`
    async fn click_with_text(&self, selector: &str, text: &str) -> Result<()>;

    /// Wait for a selector to appear
    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()>;

    /// Wait for an element matching the selector whose text contains `text`
    async fn wait_for_text(&self, selector: &str, text: &str, timeout_ms: u64) -> Result<()>;
}

/// Host part of a URL, used to label navigation logs and timeouts.
pub fn host_of(url: &str) -> Result<String> {
    let parsed =
        url::Url::parse(url).map_err(|e| BrowserError::Navigation(format!("{url}: {e}")))?;
    match parsed.host_str() {
        Some(host) => Ok(host.to_string()),
        None => Err(BrowserError::Navigation(format!("{url}: no host"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_of_storefront_urls() {
        assert_eq!(
            host_of("https://www.amazon.com/dp/B0CL9BTQRF?psc=1").unwrap(),
            "www.amazon.com"
        );
        assert_eq!(host_of("http://127.0.0.1:8080/cart").unwrap(), "127.0.0.1");
    }

    #[test]
    fn test_host_of_rejects_relative_and_hostless() {
        assert!(host_of("/gp/cart/view.html").is_err());
        assert!(host_of("data:text/html,<p>hi</p>").is_err());
    }
}
