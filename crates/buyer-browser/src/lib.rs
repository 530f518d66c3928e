//! Browser automation engine for the storefront pages.
//!
//! Provides the [`BrowserActions`] page-automation capability the captcha
//! pipeline and the purchase flow are written against, and a headless
//! Chromium implementation of it.

pub mod actions;
pub mod engine;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use actions::BrowserActions;
pub use engine::BrowserEngine;
pub use error::{BrowserError, Result};
