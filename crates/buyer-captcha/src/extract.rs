//! OCR text extraction.
//!
//! [`TextExtractor`] is the boundary where OCR failures stop being errors:
//! whatever goes wrong inside the engine, callers get an
//! [`ExtractionResult`], empty when nothing usable was recognized.

use crate::artifact::NormalizedArtifact;
use crate::error::OcrError;
use async_trait::async_trait;
use buyer_core::OcrConfig;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

/// OCR engine capability.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognize text in a PNG image using one language model.
    async fn recognize(&self, png: &[u8], language: &str) -> Result<String, OcrError>;
}

/// Tesseract, driven through its command-line executable.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    executable: PathBuf,
    page_segmentation_mode: u8,
    timeout: Duration,
}

impl TesseractEngine {
    /// Create an engine running `executable`.
    #[must_use]
    pub fn new(executable: impl Into<PathBuf>, page_segmentation_mode: u8, timeout: Duration) -> Self {
        Self {
            executable: executable.into(),
            page_segmentation_mode,
            timeout,
        }
    }

    /// Create an engine from the `[ocr]` config section.
    #[must_use]
    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(
            config.tesseract_path.clone(),
            config.page_segmentation_mode,
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    async fn recognize(&self, png: &[u8], language: &str) -> Result<String, OcrError> {
        // One input file per call; removed when `input` drops
        let input = tempfile::Builder::new()
            .prefix("challenge-")
            .suffix(".png")
            .tempfile()?;
        tokio::fs::write(input.path(), png).await?;

        let child = tokio::process::Command::new(&self.executable)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(language)
            .arg("--psm")
            .arg(self.page_segmentation_mode.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(OcrError::Spawn)?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| OcrError::Timeout(self.timeout))??;

        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines().filter(|line| !line.trim().is_empty()) {
            tracing::debug!("tesseract: {}", line);
        }

        if !output.status.success() {
            return Err(OcrError::Failed {
                status: output.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Best-effort OCR output.
///
/// Empty text means the extraction failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    text: String,
}

impl ExtractionResult {
    /// Build a result from raw engine output, trimming surrounding whitespace.
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        Self {
            text: raw.trim().to_string(),
        }
    }

    /// The failed extraction.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Recognized text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether nothing was recognized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Take the recognized text.
    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }
}

/// Runs OCR over normalized artifacts without ever failing.
#[derive(Clone)]
pub struct TextExtractor {
    engine: Arc<dyn OcrEngine>,
    language: String,
    timeout: Duration,
}

impl TextExtractor {
    /// Create an extractor for one fixed language model.
    ///
    /// `timeout` bounds every call regardless of the engine's own limits.
    pub fn new(engine: Arc<dyn OcrEngine>, language: impl Into<String>, timeout: Duration) -> Self {
        Self {
            engine,
            language: language.into(),
            timeout,
        }
    }

    /// Tesseract-backed extractor from the `[ocr]` config section.
    #[must_use]
    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(
            Arc::new(TesseractEngine::from_config(config)),
            config.language.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Recognize the text of a normalized challenge.
    ///
    /// Engine errors and timeouts are logged and produce an empty result.
    pub async fn extract_text(&self, artifact: &NormalizedArtifact) -> ExtractionResult {
        let recognition = self.engine.recognize(artifact.png(), &self.language);

        match tokio::time::timeout(self.timeout, recognition).await {
            Ok(Ok(raw)) => {
                let result = ExtractionResult::from_raw(&raw);
                tracing::info!("Extracted CAPTCHA text: {:?}", result.text());
                result
            }
            Ok(Err(e)) => {
                tracing::warn!("Error extracting text from CAPTCHA image: {}", e);
                ExtractionResult::empty()
            }
            Err(_) => {
                tracing::warn!("CAPTCHA OCR did not finish within {:?}", self.timeout);
                ExtractionResult::empty()
            }
        }
    }
}

impl std::fmt::Debug for TextExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextExtractor")
            .field("language", &self.language)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
