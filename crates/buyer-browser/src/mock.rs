//! In-memory page for exercising code written against [`BrowserActions`].
//!
//! The page is a flat set of selectors that "exist". Selectors can be marked
//! off-screen (until scrolled into view), given text, made to show up only
//! after a delay, given screenshot bytes, or made to fail a specific
//! operation. Every call is recorded in order.

use crate::actions::BrowserActions;
use crate::error::{BrowserError, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Poll interval of the waiting operations.
const POLL: Duration = Duration::from_millis(10);

/// Operations of [`BrowserActions`], used to script failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// [`BrowserActions::navigate`]
    Navigate,
    /// [`BrowserActions::element_exists`]
    ElementExists,
    /// [`BrowserActions::is_visible`]
    IsVisible,
    /// [`BrowserActions::scroll_into_view`]
    ScrollIntoView,
    /// [`BrowserActions::screenshot_element`]
    ScreenshotElement,
    /// [`BrowserActions::fill_field`]
    FillField,
    /// [`BrowserActions::click`]
    Click,
    /// [`BrowserActions::click_with_text`]
    ClickWithText,
    /// [`BrowserActions::wait_for_selector`]
    WaitForSelector,
    /// [`BrowserActions::wait_for_text`]
    WaitForText,
}

/// A recorded call against the mock page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCall {
    /// URL
    Navigate(String),
    /// Selector
    ElementExists(String),
    /// Selector
    IsVisible(String),
    /// Selector
    ScrollIntoView(String),
    /// Selector
    ScreenshotElement(String),
    /// Selector and typed value
    FillField(String, String),
    /// Selector
    Click(String),
    /// Selector and wanted text
    ClickWithText(String, String),
    /// Selector
    WaitForSelector(String),
    /// Selector and wanted text
    WaitForText(String, String),
}

impl PageCall {
    /// The operation this call belongs to.
    #[must_use]
    pub fn operation(&self) -> Operation {
        match self {
            Self::Navigate(_) => Operation::Navigate,
            Self::ElementExists(_) => Operation::ElementExists,
            Self::IsVisible(_) => Operation::IsVisible,
            Self::ScrollIntoView(_) => Operation::ScrollIntoView,
            Self::ScreenshotElement(_) => Operation::ScreenshotElement,
            Self::FillField(_, _) => Operation::FillField,
            Self::Click(_) => Operation::Click,
            Self::ClickWithText(_, _) => Operation::ClickWithText,
            Self::WaitForSelector(_) => Operation::WaitForSelector,
            Self::WaitForText(_, _) => Operation::WaitForText,
        }
    }
}

/// Text carried by one element, shown from `from` on.
#[derive(Debug)]
struct TextNode {
    selector: String,
    text: String,
    from: Instant,
}

/// Scriptable stand-in for a browser tab.
#[derive(Debug, Default)]
pub struct MockPage {
    present: HashSet<String>,
    late: HashMap<String, Instant>,
    texts: Vec<TextNode>,
    offscreen: Mutex<HashSet<String>>,
    screenshots: HashMap<String, Vec<u8>>,
    failures: HashMap<(Operation, String), BrowserError>,
    latency: Duration,
    calls: Mutex<Vec<PageCall>>,
}

impl MockPage {
    /// An empty page: nothing matches, every navigation succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a selector as present and on screen.
    #[must_use]
    pub fn with_element(mut self, selector: &str) -> Self {
        self.present.insert(selector.to_string());
        self
    }

    /// Mark a selector as present once `delay` has passed since this call.
    #[must_use]
    pub fn with_late_element(mut self, selector: &str, delay: Duration) -> Self {
        self.late.insert(selector.to_string(), Instant::now() + delay);
        self
    }

    /// Add an element matching `selector` whose text is `text`.
    #[must_use]
    pub fn with_text(self, selector: &str, text: &str) -> Self {
        self.with_late_text(selector, text, Duration::ZERO)
    }

    /// Like [`MockPage::with_text`], but the element only renders after `delay`.
    #[must_use]
    pub fn with_late_text(mut self, selector: &str, text: &str, delay: Duration) -> Self {
        self.texts.push(TextNode {
            selector: selector.to_string(),
            text: text.to_string(),
            from: Instant::now() + delay,
        });
        self
    }

    /// Mark a selector as present but outside the viewport until scrolled to.
    #[must_use]
    pub fn with_offscreen_element(mut self, selector: &str) -> Self {
        self.present.insert(selector.to_string());
        self.offscreen
            .get_mut()
            .expect("mock page lock poisoned")
            .insert(selector.to_string());
        self
    }

    /// Bytes returned when the element is screenshotted.
    #[must_use]
    pub fn with_screenshot(mut self, selector: &str, bytes: Vec<u8>) -> Self {
        self.screenshots.insert(selector.to_string(), bytes);
        self
    }

    /// Make `operation` on `key` (selector or URL) fail with `error`.
    #[must_use]
    pub fn failing(mut self, operation: Operation, key: &str, error: BrowserError) -> Self {
        self.failures.insert((operation, key.to_string()), error);
        self
    }

    /// Delay every call, to exercise timeouts of callers.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// All calls made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<PageCall> {
        self.calls.lock().expect("mock page lock poisoned").clone()
    }

    /// Number of calls made for one operation.
    #[must_use]
    pub fn count(&self, operation: Operation) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    async fn record(&self, call: PageCall) {
        self.calls.lock().expect("mock page lock poisoned").push(call);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn scripted(&self, operation: Operation, key: &str) -> Result<()> {
        match self.failures.get(&(operation, key.to_string())) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn rendered_texts<'a>(&'a self, selector: &'a str) -> impl Iterator<Item = &'a TextNode> {
        let now = Instant::now();
        self.texts
            .iter()
            .filter(move |node| node.selector == selector && node.from <= now)
    }

    fn has(&self, selector: &str) -> bool {
        self.present.contains(selector)
            || self.late.get(selector).is_some_and(|from| *from <= Instant::now())
            || self.rendered_texts(selector).next().is_some()
    }

    /// Elements without text accept any wanted text.
    fn has_text(&self, selector: &str, text: &str) -> bool {
        let has_texts = self.texts.iter().any(|node| node.selector == selector);
        if has_texts {
            self.rendered_texts(selector).any(|node| node.text.contains(text))
        } else {
            self.has(selector)
        }
    }

    fn require(&self, selector: &str) -> Result<()> {
        if self.has(selector) {
            Ok(())
        } else {
            Err(BrowserError::SelectorNotFound(selector.to_string()))
        }
    }

    async fn poll_until<F>(&self, timeout_ms: u64, what: String, ready: F) -> Result<()>
    where
        F: Fn() -> bool + Send + Sync,
    {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if ready() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout(format!("{what} ({timeout_ms}ms)")));
            }
            tokio::time::sleep(POLL).await;
        }
    }
}

#[async_trait::async_trait]
impl BrowserActions for MockPage {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.record(PageCall::Navigate(url.to_string())).await;
        self.scripted(Operation::Navigate, url)
    }

    async fn element_exists(&self, selector: &str) -> Result<bool> {
        self.record(PageCall::ElementExists(selector.to_string())).await;
        self.scripted(Operation::ElementExists, selector)?;
        Ok(self.has(selector))
    }

    async fn is_visible(&self, selector: &str) -> Result<bool> {
        self.record(PageCall::IsVisible(selector.to_string())).await;
        self.scripted(Operation::IsVisible, selector)?;
        self.require(selector)?;
        let offscreen = self.offscreen.lock().expect("mock page lock poisoned");
        Ok(!offscreen.contains(selector))
    }

    async fn scroll_into_view(&self, selector: &str) -> Result<()> {
        self.record(PageCall::ScrollIntoView(selector.to_string())).await;
        self.scripted(Operation::ScrollIntoView, selector)?;
        self.require(selector)?;
        self.offscreen
            .lock()
            .expect("mock page lock poisoned")
            .remove(selector);
        Ok(())
    }

    async fn screenshot_element(&self, selector: &str) -> Result<Vec<u8>> {
        self.record(PageCall::ScreenshotElement(selector.to_string())).await;
        self.scripted(Operation::ScreenshotElement, selector)?;
        self.require(selector)?;
        Ok(self.screenshots.get(selector).cloned().unwrap_or_default())
    }

    async fn fill_field(&self, selector: &str, value: &str) -> Result<()> {
        self.record(PageCall::FillField(selector.to_string(), value.to_string())).await;
        self.scripted(Operation::FillField, selector)?;
        self.require(selector)
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.record(PageCall::Click(selector.to_string())).await;
        self.scripted(Operation::Click, selector)?;
        self.require(selector)
    }

    async fn click_with_text(&self, selector: &str, text: &str) -> Result<()> {
        self.record(PageCall::ClickWithText(selector.to_string(), text.to_string())).await;
        self.scripted(Operation::ClickWithText, selector)?;
        if self.has_text(selector, text) {
            Ok(())
        } else {
            Err(BrowserError::SelectorNotFound(format!(
                "{selector} with text {text:?}"
            )))
        }
    }

    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        self.record(PageCall::WaitForSelector(selector.to_string())).await;
        self.scripted(Operation::WaitForSelector, selector)?;
        self.poll_until(timeout_ms, format!("waiting for {selector}"), || {
            self.has(selector)
        })
        .await
    }

    async fn wait_for_text(&self, selector: &str, text: &str, timeout_ms: u64) -> Result<()> {
        self.record(PageCall::WaitForText(selector.to_string(), text.to_string())).await;
        self.scripted(Operation::WaitForText, selector)?;
        self.poll_until(
            timeout_ms,
            format!("waiting for {selector} with text {text:?}"),
            || self.has_text(selector, text),
        )
        .await
    }
}
