use crate::actions::{host_of, BrowserActions};
use crate::error::{BrowserError, Result};
use buyer_core::BrowserConfig;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromiumConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures_util::stream::StreamExt;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Poll interval while waiting for a selector to show up.
const SELECTOR_POLL_MS: u64 = 100;

/// Visible means rendered with a non-empty box that intersects the viewport.
const IS_VISIBLE_JS: &str = r"function() {
    const rect = this.getBoundingClientRect();
    const style = window.getComputedStyle(this);
    if (style.visibility === 'hidden' || style.display === 'none') return false;
    if (rect.width === 0 || rect.height === 0) return false;
    return rect.bottom > 0 && rect.right > 0
        && rect.top < window.innerHeight && rect.left < window.innerWidth;
}";

const CLEAR_VALUE_JS: &str = r"function() {
    this.focus();
    this.value = '';
    this.dispatchEvent(new Event('input', { bubbles: true }));
}";

/// Browser automation engine backed by a single Chromium tab.
pub struct BrowserEngine {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    navigation_timeout: Duration,
    element_timeout: Duration,
}

impl BrowserEngine {
    /// Launch Chromium with default settings (headless, 1920x1080)
    pub async fn new() -> Result<Self> {
        Self::with_config(&BrowserConfig::default()).await
    }

    /// Launch Chromium according to the browser section of the app config
    pub async fn with_config(config: &BrowserConfig) -> Result<Self> {
        let mut builder = ChromiumConfig::builder()
            .no_sandbox()
            .window_size(config.window_width, config.window_height)
            .request_timeout(Duration::from_secs(config.navigation_timeout_secs));
        if !config.headless {
            builder = builder.with_head();
        }
        let chromium_config = builder.build().map_err(BrowserError::Chromium)?;

        let (browser, mut handler) = Browser::launch(chromium_config)
            .await
            .map_err(|e| BrowserError::Chromium(e.to_string()))?;

        // Drive the CDP connection for the lifetime of the engine
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("browser handler event error: {}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Chromium(e.to_string()))?;

        tracing::info!(
            "Browser launched (headless: {}, window: {}x{})",
            config.headless,
            config.window_width,
            config.window_height
        );

        Ok(Self {
            browser,
            page,
            handler,
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
            element_timeout: Duration::from_millis(config.element_timeout_ms),
        })
    }

    /// Close the browser and stop the CDP handler task
    pub async fn close(mut self) -> Result<()> {
        let result = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| BrowserError::Chromium(e.to_string()));
        self.handler.abort();
        result
    }

    /// Run a browser call under the per-element timeout
    async fn bounded<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.element_timeout, fut)
            .await
            .map_err(|_| BrowserError::Timeout(what.to_string()))?
    }

    async fn find(&self, selector: &str) -> Result<Element> {
        self.page
            .find_element(selector)
            .await
            .map_err(|e| BrowserError::SelectorNotFound(format!("{selector}: {e}")))
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        self.page
            .find_elements(selector)
            .await
            .map(|elements| elements.len())
            .map_err(|e| BrowserError::Chromium(e.to_string()))
    }

    async fn evaluate_bool(&self, script: String) -> Result<bool> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::Script(e.to_string()))?
            .into_value()
            .map_err(|e| BrowserError::Script(e.to_string()))
    }
}

/// Script finding the first `selector` match whose rendered text contains
/// `text`, optionally clicking it. Evaluates to whether it was found.
fn text_lookup_script(selector: &str, text: &str, click: bool) -> Result<String> {
    let selector_js =
        serde_json::to_string(selector).map_err(|e| BrowserError::Script(e.to_string()))?;
    let text_js = serde_json::to_string(text).map_err(|e| BrowserError::Script(e.to_string()))?;
    let action = if click {
        "target.scrollIntoView({ block: 'center' }); target.click();"
    } else {
        ""
    };
    Ok(format!(
        "(() => {{
            const wanted = {text_js};
            const target = Array.from(document.querySelectorAll({selector_js}))
                .find(el => (el.innerText || el.textContent || '').includes(wanted));
            if (!target) return false;
            {action}
            return true;
        }})()"
    ))
}

#[async_trait::async_trait]
impl BrowserActions for BrowserEngine {
    async fn navigate(&self, url: &str) -> Result<()> {
        let domain = host_of(url)?;
        tracing::debug!("Navigating to {} ({})", url, domain);

        tokio::time::timeout(self.navigation_timeout, self.page.goto(url))
            .await
            .map_err(|_| BrowserError::Timeout(format!("navigation to {domain}")))?
            .map_err(|e| BrowserError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn element_exists(&self, selector: &str) -> Result<bool> {
        let count = self.bounded(selector, self.count(selector)).await?;
        Ok(count > 0)
    }

    async fn is_visible(&self, selector: &str) -> Result<bool> {
        self.bounded(selector, async {
            let element = self.find(selector).await?;
            let returns = element
                .call_js_fn(IS_VISIBLE_JS, false)
                .await
                .map_err(|e| BrowserError::Script(e.to_string()))?;
            Ok(returns
                .result
                .value
                .and_then(|value| value.as_bool())
                .unwrap_or(false))
        })
        .await
    }

    async fn scroll_into_view(&self, selector: &str) -> Result<()> {
        self.bounded(selector, async {
            let element = self.find(selector).await?;
            element
                .scroll_into_view()
                .await
                .map_err(|e| BrowserError::Chromium(e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn screenshot_element(&self, selector: &str) -> Result<Vec<u8>> {
        self.bounded(selector, async {
            let element = self.find(selector).await?;
            element
                .screenshot(CaptureScreenshotFormat::Png)
                .await
                .map_err(|e| BrowserError::Chromium(e.to_string()))
        })
        .await
    }

    async fn fill_field(&self, selector: &str, value: &str) -> Result<()> {
        self.bounded(selector, async {
            let element = self.find(selector).await?;
            element
                .call_js_fn(CLEAR_VALUE_JS, false)
                .await
                .map_err(|e| BrowserError::Script(e.to_string()))?;
            element
                .type_str(value)
                .await
                .map_err(|e| BrowserError::Chromium(e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.bounded(selector, async {
            let element = self.find(selector).await?;
            element
                .click()
                .await
                .map_err(|e| BrowserError::Chromium(e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn click_with_text(&self, selector: &str, text: &str) -> Result<()> {
        let script = text_lookup_script(selector, text, true)?;
        let clicked = self.bounded(selector, self.evaluate_bool(script)).await?;

        if clicked {
            Ok(())
        } else {
            Err(BrowserError::SelectorNotFound(format!(
                "{selector} with text {text:?}"
            )))
        }
    }

    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        let poll = async {
            loop {
                if self.count(selector).await? > 0 {
                    return Ok::<(), BrowserError>(());
                }
                tokio::time::sleep(Duration::from_millis(SELECTOR_POLL_MS)).await;
            }
        };

        tokio::time::timeout(Duration::from_millis(timeout_ms), poll)
            .await
            .map_err(|_| BrowserError::Timeout(format!("waiting for {selector}")))?
    }

    async fn wait_for_text(&self, selector: &str, text: &str, timeout_ms: u64) -> Result<()> {
        let script = text_lookup_script(selector, text, false)?;
        let poll = async {
            loop {
                if self.evaluate_bool(script.clone()).await? {
                    return Ok::<(), BrowserError>(());
                }
                tokio::time::sleep(Duration::from_millis(SELECTOR_POLL_MS)).await;
            }
        };

        tokio::time::timeout(Duration::from_millis(timeout_ms), poll)
            .await
            .map_err(|_| {
                BrowserError::Timeout(format!("waiting for {selector} with text {text:?}"))
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_lookup_escapes_literals() {
        let script = text_lookup_script("a", r#"Say "hi"</script>"#, false).unwrap();
        assert!(script.contains(r#"const wanted = "Say \"hi\"</script>";"#));
        assert!(script.contains(r#"document.querySelectorAll("a")"#));
        assert!(!script.contains("target.click()"));
    }

    #[test]
    fn test_text_lookup_clicks_when_asked() {
        let script = text_lookup_script("button", "Continue shopping", true).unwrap();
        assert!(script.contains("target.click();"));
    }
}
