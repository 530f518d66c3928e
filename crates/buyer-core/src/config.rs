//! Configuration management for the buyer workspace.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use crate::types::{PageUrl, Secret};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration.
///
/// This is loaded from `~/.config/buyer/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Browser automation settings
    pub browser: BrowserConfig,
    /// CAPTCHA detection and submission selectors
    pub captcha: CaptchaConfig,
    /// OCR engine settings
    pub ocr: OcrConfig,
    /// Purchase flow settings
    pub flow: FlowConfig,
}

impl AppConfig {
    /// Load configuration from the default location, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file.
    ///
    /// Unlike [`AppConfig::load`], a missing file is an error here.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `BUYER_HEADLESS`: Override browser headless mode (true/false)
    /// - `BUYER_FLOW_TIMEOUT_SECS`: Override the overall flow timeout
    /// - `BUYER_TESSERACT_PATH`: Override the tesseract executable
    /// - `BUYER_EMAIL` / `BUYER_PASSWORD`: Sign-in credentials (env only)
    pub fn load_with_env(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup.
    ///
    /// Unparseable values are ignored and leave the configured value in place.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("BUYER_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Some(val) = lookup("BUYER_FLOW_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                self.flow.timeout_secs = secs;
                tracing::debug!("Override flow.timeout_secs from env: {}", secs);
            }
        }

        if let Some(val) = lookup("BUYER_TESSERACT_PATH") {
            if !val.is_empty() {
                tracing::debug!("Override ocr.tesseract_path from env: {}", val);
                self.ocr.tesseract_path = PathBuf::from(val);
            }
        }

        if let Some(val) = lookup("BUYER_EMAIL") {
            self.flow.email = Some(Secret::new(val));
        }

        if let Some(val) = lookup("BUYER_PASSWORD") {
            self.flow.password = Some(Secret::new(val));
        }
    }

    /// Check values that would make the flow misbehave rather than fail loudly.
    pub fn validate(&self) -> ConfigResult<()> {
        let non_zero = [
            ("flow.timeout_secs", self.flow.timeout_secs),
            ("flow.step_timeout_ms", self.flow.step_timeout_ms),
            ("flow.page_timeout_ms", self.flow.page_timeout_ms),
            ("ocr.timeout_secs", self.ocr.timeout_secs),
            ("browser.navigation_timeout_secs", self.browser.navigation_timeout_secs),
            ("browser.element_timeout_ms", self.browser.element_timeout_ms),
        ];
        for (field, value) in non_zero {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be greater than zero",
                });
            }
        }

        if self.captcha.marker_selector.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "captcha.marker_selector",
                reason: "must not be empty",
            });
        }

        if self.ocr.language.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "ocr.language",
                reason: "must not be empty",
            });
        }

        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/buyer/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "buyer", "buyer").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Navigation timeout in seconds
    pub navigation_timeout_secs: u64,
    /// Upper bound for a single element lookup, probe or screenshot
    pub element_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            navigation_timeout_secs: 30,
            element_timeout_ms: 5000,
        }
    }
}

/// Selectors and timings for the challenge page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptchaConfig {
    /// Marker whose presence means a challenge is shown
    pub marker_selector: String,
    /// Text input receiving the decoded answer
    pub answer_selector: String,
    /// Elements considered for the confirm action
    pub confirm_selector: String,
    /// Visible text identifying the confirm button among `confirm_selector` matches
    pub confirm_text: String,
    /// Wait after detection so the challenge image finishes loading
    pub settle_delay_ms: u64,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            marker_selector: "form img".to_string(),
            answer_selector: r#"input[placeholder="Type characters"]"#.to_string(),
            confirm_selector: "button".to_string(),
            confirm_text: "Continue shopping".to_string(),
            settle_delay_ms: 2000,
        }
    }
}

/// OCR engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Tesseract executable, resolved through `PATH` when relative
    pub tesseract_path: PathBuf,
    /// Tesseract language model
    pub language: String,
    /// Tesseract `--psm` value (7 = single text line)
    pub page_segmentation_mode: u8,
    /// Upper bound for one recognition run
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_path: PathBuf::from("tesseract"),
            language: "eng".to_string(),
            page_segmentation_mode: 7,
            timeout_secs: 15,
        }
    }
}

/// Purchase flow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Store landing page, where a challenge may be shown
    pub home_url: PageUrl,
    /// Product detail page to buy from
    pub product_url: PageUrl,
    /// Deadline for the whole flow in seconds
    pub timeout_secs: u64,
    /// Wait for a step's element when it follows an action on the same page
    pub step_timeout_ms: u64,
    /// Wait for a step's element when it follows a page load
    pub page_timeout_ms: u64,
    /// Sign-in email (taken from `BUYER_EMAIL`, never stored)
    #[serde(skip)]
    pub email: Option<Secret>,
    /// Sign-in password (taken from `BUYER_PASSWORD`, never stored)
    #[serde(skip)]
    pub password: Option<Secret>,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            home_url: PageUrl::new("https://www.amazon.com").expect("valid default url"),
            product_url: PageUrl::new(
                "https://www.amazon.com/Amazon-Basics-Microphone-Podcasting-Adjustable/dp/B0CL9BTQRF",
            )
            .expect("valid default url"),
            timeout_secs: 60,
            step_timeout_ms: 10_000,
            page_timeout_ms: 30_000,
            email: None,
            password: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.browser.headless);
        assert_eq!(config.captcha.marker_selector, "form img");
        assert_eq!(config.captcha.settle_delay_ms, 2000);
        assert_eq!(config.ocr.language, "eng");
        assert_eq!(config.flow.timeout_secs, 60);
        assert_eq!(config.flow.step_timeout_ms, 10_000);
        assert_eq!(config.flow.page_timeout_ms, 30_000);
        assert!(config.flow.email.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let mut config = AppConfig::default();
        config.flow.password = Some(Secret::new("hunter2"));

        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("[browser]"));
        assert!(toml_str.contains("[captcha]"));
        assert!(toml_str.contains("[ocr]"));
        assert!(toml_str.contains("[flow]"));
        assert!(!toml_str.contains("hunter2"));

        let parsed: AppConfig = toml::from_str(&toml_str).expect("parse serialized config");
        assert_eq!(parsed.flow.home_url, config.flow.home_url);
        assert!(parsed.flow.password.is_none());
    }

    #[test]
    fn test_config_load_from_file() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("config.toml");

        let mut config = AppConfig::default();
        config.ocr.page_segmentation_mode = 8;
        config.flow.home_url = PageUrl::new("http://localhost:3000").expect("valid url");

        let contents = toml::to_string_pretty(&config).expect("serialize config");
        fs::write(&config_path, contents).expect("write config file");

        let loaded = AppConfig::load_from(&config_path).expect("load config");
        assert_eq!(loaded.ocr.page_segmentation_mode, 8);
        assert_eq!(loaded.flow.home_url.as_str(), "http://localhost:3000");
    }

    #[test]
    fn test_load_from_missing_file() {
        let tmp = TempDir::new().expect("create temp dir");
        let err = AppConfig::load_from(&tmp.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_load_from_malformed_file() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("config.toml");
        fs::write(&config_path, "[flow\ntimeout_secs = 90").expect("write config file");

        let err = AppConfig::load_from(&config_path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { ref path, .. } if path == &config_path));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("BUYER_HEADLESS", "false"),
            ("BUYER_FLOW_TIMEOUT_SECS", "120"),
            ("BUYER_TESSERACT_PATH", "/opt/tesseract/bin/tesseract"),
            ("BUYER_EMAIL", "buyer@example.com"),
            ("BUYER_PASSWORD", "hunter2"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env_overrides(|key| vars.get(key).map(ToString::to_string));

        assert!(!config.browser.headless);
        assert_eq!(config.flow.timeout_secs, 120);
        assert_eq!(
            config.ocr.tesseract_path,
            PathBuf::from("/opt/tesseract/bin/tesseract")
        );
        assert_eq!(
            config.flow.email.as_ref().map(Secret::expose),
            Some("buyer@example.com")
        );
        assert_eq!(config.flow.password.as_ref().map(Secret::expose), Some("hunter2"));
    }

    #[test]
    fn test_env_overrides_ignore_garbage() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(|key| match key {
            "BUYER_HEADLESS" => Some("sometimes".to_string()),
            "BUYER_FLOW_TIMEOUT_SECS" => Some("soon".to_string()),
            _ => None,
        });

        assert!(config.browser.headless);
        assert_eq!(config.flow.timeout_secs, 60);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r##"
[captcha]
marker_selector = "#captcha img"

[flow]
timeout_secs = 90
"##;

        let config: AppConfig = toml::from_str(toml_str).expect("parse partial config");
        assert_eq!(config.captcha.marker_selector, "#captcha img");
        assert_eq!(config.flow.timeout_secs, 90);
        // These should be defaults
        assert_eq!(config.captcha.confirm_text, "Continue shopping");
        assert!(config.browser.headless);
    }

    #[test]
    fn test_invalid_url_rejected() {
        let toml_str = r#"
[flow]
home_url = "www.example.com"
"#;

        assert!(toml::from_str::<AppConfig>(toml_str).is_err());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = AppConfig::default();
        config.ocr.timeout_secs = 0;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ocr.timeout_secs"));
    }

    #[test]
    fn test_validate_zero_page_timeout() {
        let mut config = AppConfig::default();
        config.flow.page_timeout_ms = 0;

        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { field: "flow.page_timeout_ms", .. }
        ));
    }
}
