//! Buyer Core - Foundation crate for the buyer workspace.
//!
//! This crate provides shared types, error handling and configuration
//! management that the browser, captcha and flow crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`types`] - Shared newtypes (`PageUrl`, `Secret`)
//!
//! # Example
//!
//! ```rust
//! use buyer_core::AppConfig;
//!
//! let config = AppConfig::default();
//! assert_eq!(config.captcha.marker_selector, "form img");
//! assert_eq!(config.ocr.language, "eng");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, BrowserConfig, CaptchaConfig, FlowConfig, OcrConfig};
pub use error::{BuyerError, ConfigError, ConfigResult};
pub use types::{PageUrl, Secret};
