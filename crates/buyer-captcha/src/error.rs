//! Error types for the captcha pipeline.
//!
//! Each fallible step owns exactly one error type. The resolver turns
//! [`VisibilityError`] and [`CaptureError`] into a manual-intervention
//! outcome, only logs [`SubmissionError`], and hands [`NormalizationError`]
//! to its caller. [`OcrError`] never leaves the extractor.

use buyer_browser::BrowserError;
use std::time::Duration;
use thiserror::Error;

/// The challenge region could not be brought into the viewport.
#[derive(Error, Debug)]
#[error("challenge {selector} could not be made visible: {source}")]
pub struct VisibilityError {
    /// Selector of the challenge marker
    pub selector: String,
    /// Failing browser call (visibility probe or scroll)
    #[source]
    pub source: BrowserError,
}

/// The challenge region could not be snapshotted.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// Browser call failed (stale element, timeout)
    #[error("failed to capture challenge {selector}: {source}")]
    Browser {
        /// Selector of the challenge marker
        selector: String,
        /// Underlying browser error
        #[source]
        source: BrowserError,
    },

    /// Screenshot came back without any bytes
    #[error("capture of challenge {selector} returned an empty image")]
    EmptySnapshot {
        /// Selector of the challenge marker
        selector: String,
    },
}

/// The captured image could not be turned into an OCR input.
///
/// This points at the local environment, not at the page.
#[derive(Error, Debug)]
pub enum NormalizationError {
    /// Captured bytes are not a decodable image
    #[error("failed to decode captured challenge image: {0}")]
    Decode(#[source] image::ImageError),

    /// Normalized image could not be encoded for the OCR engine
    #[error("failed to encode normalized challenge image: {0}")]
    Encode(#[source] image::ImageError),
}

/// Answer entry or confirmation failed. Logged, never escalated.
#[derive(Error, Debug)]
pub enum SubmissionError {
    /// Answer input missing or not editable
    #[error("failed to fill captcha answer into {selector}: {source}")]
    Fill {
        /// Answer input selector
        selector: String,
        /// Underlying browser error
        #[source]
        source: BrowserError,
    },

    /// Confirm action missing or not clickable
    #[error("failed to confirm captcha answer via {selector} {text:?}: {source}")]
    Confirm {
        /// Confirm button selector
        selector: String,
        /// Confirm button text
        text: String,
        /// Underlying browser error
        #[source]
        source: BrowserError,
    },
}

/// OCR engine failure, swallowed by the extractor.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Engine executable could not be started
    #[error("failed to start OCR engine: {0}")]
    Spawn(#[source] std::io::Error),

    /// Temporary input or process I/O failed
    #[error("OCR I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Engine exceeded its time budget and was killed
    #[error("OCR engine timed out after {0:?}")]
    Timeout(Duration),

    /// Engine exited unsuccessfully
    #[error("OCR engine exited with status {status:?}: {stderr}")]
    Failed {
        /// Exit code, if the process was not killed by a signal
        status: Option<i32>,
        /// Captured standard error
        stderr: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_error_display() {
        let err = VisibilityError {
            selector: "form img".to_string(),
            source: BrowserError::Chromium("node is detached".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "challenge form img could not be made visible: chromium error: node is detached"
        );
    }

    #[test]
    fn test_capture_error_display() {
        let err = CaptureError::EmptySnapshot {
            selector: "form img".to_string(),
        };
        assert!(err.to_string().contains("empty image"));
    }

    #[test]
    fn test_ocr_timeout_display() {
        let err = OcrError::Timeout(Duration::from_secs(15));
        assert_eq!(err.to_string(), "OCR engine timed out after 15s");
    }
}
