//! Buyer Captcha - resolution of the visual CAPTCHA shown by the storefront.
//!
//! The pipeline is a single linear attempt:
//! detect → ensure visible → capture → normalize → extract → submit.
//! Page and OCR failures become a [`ResolutionOutcome::ManualInterventionRequired`]
//! so an operator can take over; only a broken local environment
//! ([`NormalizationError`]) aborts the caller.
//!
//! # Architecture
//!
//! - **Detector** ([`detector`]): finds, reveals and captures the challenge image
//! - **Normalizer** ([`normalize`]): grayscale + fixed-threshold binarization
//! - **Extractor** ([`extract`]): OCR behind the [`OcrEngine`] trait, never fails
//! - **Resolver** ([`resolver`]): the state machine tying them together
//!
//! # Example
//!
//! ```rust,no_run
//! use buyer_browser::BrowserEngine;
//! use buyer_captcha::{ChallengeResolver, ResolutionOutcome};
//! use buyer_core::AppConfig;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! let engine = BrowserEngine::with_config(&config.browser).await?;
//! let resolver = ChallengeResolver::from_config(&config);
//!
//! match resolver.resolve_challenge_if_present(&engine).await? {
//!     ResolutionOutcome::ManualInterventionRequired(reason) => println!("operator needed: {reason}"),
//!     outcome => println!("continuing: {outcome:?}"),
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod artifact;
pub mod detector;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod outcome;
pub mod resolver;

// Re-export commonly used types
pub use artifact::{ChallengeArtifact, NormalizedArtifact};
pub use detector::{ChallengeDetector, ChallengeHandle};
pub use error::{CaptureError, NormalizationError, OcrError, SubmissionError, VisibilityError};
pub use extract::{ExtractionResult, OcrEngine, TesseractEngine, TextExtractor};
pub use normalize::normalize;
pub use outcome::{ManualInterventionReason, ResolutionOutcome};
pub use resolver::{ChallengeResolver, Resolution, Stage};
