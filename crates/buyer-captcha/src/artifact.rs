//! Image artifacts passed between the pipeline stages.
//!
//! Artifacts are plain values owned by one resolution attempt; nothing is
//! written to a shared location.

use crate::error::NormalizationError;
use image::{GrayImage, ImageFormat};
use std::io::Cursor;

/// Raw snapshot of the challenge region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeArtifact {
    bytes: Vec<u8>,
    format: ImageFormat,
}

impl ChallengeArtifact {
    /// Wrap encoded image bytes.
    #[must_use]
    pub fn new(bytes: Vec<u8>, format: ImageFormat) -> Self {
        Self { bytes, format }
    }

    /// Wrap encoded image bytes, sniffing the format from the header.
    ///
    /// Unknown headers are assumed to be PNG, the format screenshots are taken in.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let format = image::guess_format(&bytes).unwrap_or(ImageFormat::Png);
        Self { bytes, format }
    }

    /// Encoded image bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Encoding of [`ChallengeArtifact::bytes`].
    #[must_use]
    pub fn format(&self) -> ImageFormat {
        self.format
    }
}

/// Grayscale, two-level image ready for OCR.
///
/// Only produced by [`crate::normalize`], which guarantees every pixel is
/// either 0 or 255.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedArtifact {
    image: GrayImage,
    png: Vec<u8>,
}

impl NormalizedArtifact {
    pub(crate) fn from_binary_image(image: GrayImage) -> Result<Self, NormalizationError> {
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(NormalizationError::Encode)?;
        Ok(Self { image, png })
    }

    /// Decoded pixels.
    #[must_use]
    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    /// PNG encoding handed to the OCR engine.
    #[must_use]
    pub fn png(&self) -> &[u8] {
        &self.png
    }

    /// Whether every pixel is pure black or pure white.
    #[must_use]
    pub fn is_binary(&self) -> bool {
        self.image.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255)
    }
}

impl From<NormalizedArtifact> for ChallengeArtifact {
    fn from(normalized: NormalizedArtifact) -> Self {
        Self::new(normalized.png, ImageFormat::Png)
    }
}
