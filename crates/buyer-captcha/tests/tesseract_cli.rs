//! Exercises the Tesseract engine against stand-in executables.
#![cfg(unix)]

use buyer_captcha::{
    normalize, ChallengeArtifact, NormalizedArtifact, OcrEngine, OcrError, TesseractEngine,
    TextExtractor,
};
use image::{GrayImage, ImageFormat, Luma};
use std::io::Cursor;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Scripts are written then executed; serializing avoids "text file busy"
/// when another test forks while a script is still open for writing.
static SERIAL: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

/// Helper to write an executable shell script standing in for `tesseract`
fn fake_tesseract(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("tesseract");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
    path
}

fn sample() -> NormalizedArtifact {
    let image = GrayImage::from_fn(12, 6, |x, _| Luma([if x % 2 == 0 { 0 } else { 255 }]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode sample");
    normalize(&ChallengeArtifact::new(bytes, ImageFormat::Png)).expect("normalize sample")
}

#[tokio::test]
async fn test_passes_language_and_mode_and_reads_stdout() {
    let _serial = SERIAL.lock().await;
    let dir = TempDir::new().unwrap();
    // Echo the arguments after the input path so they can be checked
    let exe = fake_tesseract(&dir, r#"shift; echo "  $*  ""#);
    let engine = TesseractEngine::new(exe, 7, Duration::from_secs(5));

    let raw = engine.recognize(sample().png(), "eng").await.unwrap();
    assert_eq!(raw.trim(), "stdout -l eng --psm 7");
}

#[tokio::test]
async fn test_input_file_is_the_normalized_png() {
    let _serial = SERIAL.lock().await;
    let dir = TempDir::new().unwrap();
    let exe = fake_tesseract(&dir, r#"head -c 4 "$1" | od -An -c | tr -d ' \n'"#);
    let engine = TesseractEngine::new(exe, 7, Duration::from_secs(5));

    let raw = engine.recognize(sample().png(), "eng").await.unwrap();
    assert!(raw.contains("PNG"), "unexpected header dump: {raw}");
}

#[tokio::test]
async fn test_extractor_trims_recognized_text() {
    let _serial = SERIAL.lock().await;
    let dir = TempDir::new().unwrap();
    let exe = fake_tesseract(&dir, r#"printf '  XY7Q \n\n'"#);
    let extractor = TextExtractor::new(
        Arc::new(TesseractEngine::new(exe, 7, Duration::from_secs(5))),
        "eng",
        Duration::from_secs(5),
    );

    assert_eq!(extractor.extract_text(&sample()).await.text(), "XY7Q");
}

#[tokio::test]
async fn test_non_zero_exit_is_an_engine_error() {
    let _serial = SERIAL.lock().await;
    let dir = TempDir::new().unwrap();
    let exe = fake_tesseract(&dir, "echo 'Failed loading language eng' >&2; exit 1");
    let engine = TesseractEngine::new(exe, 7, Duration::from_secs(5));

    let err = engine.recognize(sample().png(), "eng").await.unwrap_err();
    match err {
        OcrError::Failed { status, stderr } => {
            assert_eq!(status, Some(1));
            assert!(stderr.contains("Failed loading language"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_hung_engine_is_killed_and_yields_empty_text() {
    let _serial = SERIAL.lock().await;
    let dir = TempDir::new().unwrap();
    let exe = fake_tesseract(&dir, "sleep 30; echo late");
    let extractor = TextExtractor::new(
        Arc::new(TesseractEngine::new(exe, 7, Duration::from_millis(300))),
        "eng",
        Duration::from_secs(5),
    );

    let started = Instant::now();
    let result = extractor.extract_text(&sample()).await;

    assert!(result.is_empty());
    assert!(started.elapsed() < Duration::from_secs(5));
}
