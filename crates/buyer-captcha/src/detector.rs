//! Challenge detection, reveal and capture.

use crate::artifact::ChallengeArtifact;
use crate::error::{CaptureError, VisibilityError};
use buyer_browser::BrowserActions;

/// A challenge found on the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeHandle {
    selector: String,
}

impl ChallengeHandle {
    /// Selector that located the challenge image.
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }
}

/// Finds and captures the challenge image on any [`BrowserActions`] page.
#[derive(Debug, Clone)]
pub struct ChallengeDetector {
    marker_selector: String,
}

impl ChallengeDetector {
    /// Create a detector looking for `marker_selector` (e.g. `form img`).
    #[must_use]
    pub fn new(marker_selector: impl Into<String>) -> Self {
        Self {
            marker_selector: marker_selector.into(),
        }
    }

    /// Look for the challenge marker.
    ///
    /// Absence is the normal case. A failing lookup is logged and treated as
    /// absence, since there is nothing to capture either way.
    pub async fn detect_challenge<P>(&self, page: &P) -> Option<ChallengeHandle>
    where
        P: BrowserActions + ?Sized,
    {
        match page.element_exists(&self.marker_selector).await {
            Ok(true) => Some(ChallengeHandle {
                selector: self.marker_selector.clone(),
            }),
            Ok(false) => None,
            Err(e) => {
                tracing::warn!(
                    "Challenge lookup for {} failed, assuming none: {}",
                    self.marker_selector,
                    e
                );
                None
            }
        }
    }

    /// Make sure the challenge is on screen, scrolling to it if needed.
    pub async fn ensure_visible<P>(
        &self,
        page: &P,
        handle: &ChallengeHandle,
    ) -> Result<(), VisibilityError>
    where
        P: BrowserActions + ?Sized,
    {
        let visible = page
            .is_visible(handle.selector())
            .await
            .map_err(|source| VisibilityError {
                selector: handle.selector.clone(),
                source,
            })?;
        if visible {
            return Ok(());
        }

        tracing::info!("CAPTCHA is not visible, scrolling it into view");
        page.scroll_into_view(handle.selector())
            .await
            .map_err(|source| VisibilityError {
                selector: handle.selector.clone(),
                source,
            })?;
        tracing::debug!("Scrolled CAPTCHA into view");
        Ok(())
    }

    /// Snapshot the challenge's bounding box.
    pub async fn capture<P>(
        &self,
        page: &P,
        handle: &ChallengeHandle,
    ) -> Result<ChallengeArtifact, CaptureError>
    where
        P: BrowserActions + ?Sized,
    {
        let bytes = page
            .screenshot_element(handle.selector())
            .await
            .map_err(|source| CaptureError::Browser {
                selector: handle.selector.clone(),
                source,
            })?;

        if bytes.is_empty() {
            return Err(CaptureError::EmptySnapshot {
                selector: handle.selector.clone(),
            });
        }

        tracing::debug!("Captured CAPTCHA image ({} bytes)", bytes.len());
        Ok(ChallengeArtifact::from_bytes(bytes))
    }
}
