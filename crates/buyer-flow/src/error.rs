//! Error types for the purchase flow.

use crate::step::FlowStep;
use buyer_browser::BrowserError;
use buyer_captcha::NormalizationError;
use thiserror::Error;

/// Errors that end a purchase flow run.
#[derive(Error, Debug)]
pub enum FlowError {
    /// Page could not be opened
    #[error("failed to open {url}: {source}")]
    Navigation {
        /// Target URL
        url: String,
        /// Underlying browser error
        #[source]
        source: BrowserError,
    },

    /// Challenge image could not be prepared for OCR
    #[error("captcha pipeline aborted: {0}")]
    Captcha(#[from] NormalizationError),

    /// A checkout step failed
    #[error("step {step} failed: {source}")]
    Step {
        /// Failing step
        step: FlowStep,
        /// Underlying browser error
        #[source]
        source: BrowserError,
    },

    /// A step needs a credential that was not configured
    #[error("step {step} needs {field}, set BUYER_{env}", env = .field.to_uppercase())]
    MissingCredential {
        /// Step that needed it
        step: FlowStep,
        /// Credential name (`email` or `password`)
        field: &'static str,
    },
}

impl FlowError {
    /// Name of the stage the flow stopped at.
    #[must_use]
    pub fn stage(&self) -> String {
        match self {
            Self::Navigation { .. } => "navigate".to_string(),
            Self::Captcha(_) => "captcha".to_string(),
            Self::Step { step, .. } | Self::MissingCredential { step, .. } => step.to_string(),
        }
    }
}

/// Result type for flow operations.
pub type Result<T> = std::result::Result<T, FlowError>;
