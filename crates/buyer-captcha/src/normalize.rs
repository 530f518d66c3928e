//! Image normalization ahead of OCR.

use crate::artifact::{ChallengeArtifact, NormalizedArtifact};
use crate::error::NormalizationError;
use image::GrayImage;

/// Luminance at or above this becomes white, everything else black.
pub const BINARIZATION_THRESHOLD: u8 = 128;

/// Convert a captured challenge into a grayscale, two-level image.
///
/// Deterministic and idempotent: normalizing the PNG of a normalized
/// artifact yields the same pixels.
pub fn normalize(artifact: &ChallengeArtifact) -> Result<NormalizedArtifact, NormalizationError> {
    let decoded = image::load_from_memory_with_format(artifact.bytes(), artifact.format())
        .map_err(NormalizationError::Decode)?;

    let mut gray = decoded.to_luma8();
    binarize(&mut gray, BINARIZATION_THRESHOLD);

    NormalizedArtifact::from_binary_image(gray)
}

fn binarize(image: &mut GrayImage, threshold: u8) {
    for pixel in image.pixels_mut() {
        pixel.0[0] = if pixel.0[0] >= threshold { 255 } else { 0 };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Luma, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode(image: &RgbImage, format: ImageFormat) -> ChallengeArtifact {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), format)
            .expect("encode test image");
        ChallengeArtifact::new(bytes, format)
    }

    /// Distorted-looking challenge: gradient background with darker glyph strokes.
    fn noisy_challenge() -> RgbImage {
        RgbImage::from_fn(64, 24, |x, y| {
            let stroke = (x / 4 + y / 3) % 5 == 0;
            let base = ((x * 3 + y * 7) % 256) as u8;
            if stroke {
                Rgb([base / 4, base / 5, base / 3])
            } else {
                Rgb([base, 255 - base / 2, (base / 2).wrapping_add(90)])
            }
        })
    }

    #[test]
    fn test_output_is_single_channel_and_binary() {
        let artifact = encode(&noisy_challenge(), ImageFormat::Png);
        let normalized = normalize(&artifact).unwrap();

        assert_eq!(normalized.image().dimensions(), (64, 24));
        assert!(normalized.is_binary());

        let reloaded = image::load_from_memory(normalized.png()).unwrap();
        assert_eq!(reloaded.color(), image::ColorType::L8);
    }

    #[test]
    fn test_threshold_boundary() {
        let image = RgbImage::from_fn(3, 1, |x, _| match x {
            0 => Rgb([127, 127, 127]),
            1 => Rgb([128, 128, 128]),
            _ => Rgb([255, 255, 255]),
        });
        let normalized = normalize(&encode(&image, ImageFormat::Png)).unwrap();

        assert_eq!(normalized.image().get_pixel(0, 0), &Luma([0]));
        assert_eq!(normalized.image().get_pixel(1, 0), &Luma([255]));
        assert_eq!(normalized.image().get_pixel(2, 0), &Luma([255]));
    }

    #[test]
    fn test_idempotent() {
        let first = normalize(&encode(&noisy_challenge(), ImageFormat::Png)).unwrap();
        let second = normalize(&ChallengeArtifact::from(first.clone())).unwrap();

        assert_eq!(first.image(), second.image());
    }

    #[test]
    fn test_deterministic() {
        let artifact = encode(&noisy_challenge(), ImageFormat::Png);
        assert_eq!(normalize(&artifact).unwrap(), normalize(&artifact).unwrap());
    }

    #[test]
    fn test_jpeg_and_alpha_inputs() {
        let jpeg = encode(&noisy_challenge(), ImageFormat::Jpeg);
        assert!(normalize(&jpeg).unwrap().is_binary());

        let rgba = RgbaImage::from_pixel(4, 4, Rgba([200, 200, 200, 0]));
        let mut bytes = Vec::new();
        rgba.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        let normalized = normalize(&ChallengeArtifact::new(bytes, ImageFormat::Png)).unwrap();
        assert!(normalized.is_binary());
    }

    #[test]
    fn test_garbage_bytes_fail() {
        let artifact = ChallengeArtifact::new(b"definitely not a png".to_vec(), ImageFormat::Png);
        assert!(matches!(
            normalize(&artifact),
            Err(NormalizationError::Decode(_))
        ));
    }
}
