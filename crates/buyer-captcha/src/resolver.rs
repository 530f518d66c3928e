//! Challenge resolution state machine.
//!
//! One call to [`ChallengeResolver::resolve_challenge_if_present`] is one
//! attempt. States only ever move forward, so every step runs at most once;
//! a new attempt means a new call with no shared state.

use crate::artifact::{ChallengeArtifact, NormalizedArtifact};
use crate::detector::{ChallengeDetector, ChallengeHandle};
use crate::error::{NormalizationError, SubmissionError};
use crate::extract::TextExtractor;
use crate::normalize::normalize;
use crate::outcome::{ManualInterventionReason, ResolutionOutcome};
use buyer_browser::BrowserActions;
use buyer_core::{AppConfig, CaptchaConfig};
use std::time::Duration;

/// Position in the resolution protocol, in the order states are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Nothing done yet
    Start,
    /// Looking for the challenge marker
    Detecting,
    /// Bringing the challenge on screen
    EnsuringVisible,
    /// Snapshotting the challenge
    Capturing,
    /// Grayscale + binarization
    Normalizing,
    /// OCR
    Extracting,
    /// Filling and confirming the answer
    Submitting,
    /// Terminal: no challenge on the page
    NoChallenge,
    /// Terminal: answer submitted
    Resolved,
    /// Terminal: operator needed
    ManualIntervention,
}

enum State {
    Start,
    Detecting,
    EnsuringVisible(ChallengeHandle),
    Capturing(ChallengeHandle),
    Normalizing(ChallengeArtifact),
    Extracting(NormalizedArtifact),
    Submitting(String),
    NoChallenge,
    Resolved(String),
    ManualIntervention(ManualInterventionReason),
}

impl State {
    fn stage(&self) -> Stage {
        match self {
            Self::Start => Stage::Start,
            Self::Detecting => Stage::Detecting,
            Self::EnsuringVisible(_) => Stage::EnsuringVisible,
            Self::Capturing(_) => Stage::Capturing,
            Self::Normalizing(_) => Stage::Normalizing,
            Self::Extracting(_) => Stage::Extracting,
            Self::Submitting(_) => Stage::Submitting,
            Self::NoChallenge => Stage::NoChallenge,
            Self::Resolved(_) => Stage::Resolved,
            Self::ManualIntervention(_) => Stage::ManualIntervention,
        }
    }
}

/// Outcome of one attempt together with the stages it went through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Terminal outcome
    pub outcome: ResolutionOutcome,
    /// Visited stages, first to last
    pub trace: Vec<Stage>,
}

/// Where the decoded answer goes.
#[derive(Debug, Clone)]
struct SubmissionTarget {
    answer_selector: String,
    confirm_selector: String,
    confirm_text: String,
}

/// Detects, reads and answers the storefront CAPTCHA.
#[derive(Debug, Clone)]
pub struct ChallengeResolver {
    detector: ChallengeDetector,
    extractor: TextExtractor,
    submission: SubmissionTarget,
    settle_delay: Duration,
}

impl ChallengeResolver {
    /// Create a resolver for the given page selectors and extractor.
    #[must_use]
    pub fn new(config: &CaptchaConfig, extractor: TextExtractor) -> Self {
        Self {
            detector: ChallengeDetector::new(config.marker_selector.clone()),
            extractor,
            submission: SubmissionTarget {
                answer_selector: config.answer_selector.clone(),
                confirm_selector: config.confirm_selector.clone(),
                confirm_text: config.confirm_text.clone(),
            },
            settle_delay: Duration::from_millis(config.settle_delay_ms),
        }
    }

    /// Tesseract-backed resolver from the application config.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.captcha, TextExtractor::from_config(&config.ocr))
    }

    /// Resolve the challenge on `page`, if there is one.
    ///
    /// Returns `Err` only when normalization fails, which the flow treats as fatal.
    pub async fn resolve_challenge_if_present<P>(
        &self,
        page: &P,
    ) -> Result<ResolutionOutcome, NormalizationError>
    where
        P: BrowserActions + ?Sized,
    {
        self.resolve(page).await.map(|resolution| resolution.outcome)
    }

    /// Same as [`ChallengeResolver::resolve_challenge_if_present`], keeping the stage trace.
    pub async fn resolve<P>(&self, page: &P) -> Result<Resolution, NormalizationError>
    where
        P: BrowserActions + ?Sized,
    {
        let mut state = State::Start;
        let mut trace = Vec::new();

        loop {
            let stage = state.stage();
            trace.push(stage);

            let next = match state {
                State::Start => State::Detecting,
                State::Detecting => self.detect(page).await,
                State::EnsuringVisible(handle) => self.ensure_visible(page, handle).await,
                State::Capturing(handle) => self.capture(page, &handle).await,
                State::Normalizing(artifact) => Self::normalize(&artifact)?,
                State::Extracting(normalized) => self.extract(&normalized).await,
                State::Submitting(text) => self.submit(page, text).await,
                State::NoChallenge => {
                    return Ok(Resolution {
                        outcome: ResolutionOutcome::NoChallengePresent,
                        trace,
                    })
                }
                State::Resolved(text) => {
                    return Ok(Resolution {
                        outcome: ResolutionOutcome::Resolved(text),
                        trace,
                    })
                }
                State::ManualIntervention(reason) => {
                    tracing::warn!(
                        "CAPTCHA requires manual intervention: {}. Please solve it manually.",
                        reason
                    );
                    return Ok(Resolution {
                        outcome: ResolutionOutcome::ManualInterventionRequired(reason),
                        trace,
                    });
                }
            };

            debug_assert!(next.stage() > stage, "resolver moved backwards");
            state = next;
        }
    }

    async fn detect<P>(&self, page: &P) -> State
    where
        P: BrowserActions + ?Sized,
    {
        let Some(handle) = self.detector.detect_challenge(page).await else {
            tracing::info!("No CAPTCHA detected. Proceeding with the next steps");
            return State::NoChallenge;
        };

        tracing::info!("CAPTCHA detected. Attempting to solve...");
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        State::EnsuringVisible(handle)
    }

    async fn ensure_visible<P>(&self, page: &P, handle: ChallengeHandle) -> State
    where
        P: BrowserActions + ?Sized,
    {
        match self.detector.ensure_visible(page, &handle).await {
            Ok(()) => State::Capturing(handle),
            Err(e) => {
                tracing::error!("Failed to bring CAPTCHA into view: {}", e);
                State::ManualIntervention(ManualInterventionReason::Visibility(e.to_string()))
            }
        }
    }

    async fn capture<P>(&self, page: &P, handle: &ChallengeHandle) -> State
    where
        P: BrowserActions + ?Sized,
    {
        match self.detector.capture(page, handle).await {
            Ok(artifact) => State::Normalizing(artifact),
            Err(e) => {
                tracing::error!("Error capturing CAPTCHA screenshot: {}", e);
                State::ManualIntervention(ManualInterventionReason::Capture(e.to_string()))
            }
        }
    }

    fn normalize(artifact: &ChallengeArtifact) -> Result<State, NormalizationError> {
        match normalize(artifact) {
            Ok(normalized) => Ok(State::Extracting(normalized)),
            Err(e) => {
                tracing::error!("CAPTCHA normalization failed, aborting: {}", e);
                Err(e)
            }
        }
    }

    async fn extract(&self, normalized: &NormalizedArtifact) -> State {
        let result = self.extractor.extract_text(normalized).await;
        if result.is_empty() {
            tracing::warn!("Failed to extract CAPTCHA text");
            State::ManualIntervention(ManualInterventionReason::EmptyExtraction)
        } else {
            State::Submitting(result.into_text())
        }
    }

    async fn submit<P>(&self, page: &P, text: String) -> State
    where
        P: BrowserActions + ?Sized,
    {
        match self.submit_answer(page, &text).await {
            Ok(()) => tracing::info!("CAPTCHA answer submitted, proceeding with automation"),
            Err(e) => tracing::warn!("{}. CAPTCHA text might be incorrect", e),
        }
        State::Resolved(text)
    }

    async fn submit_answer<P>(&self, page: &P, text: &str) -> Result<(), SubmissionError>
    where
        P: BrowserActions + ?Sized,
    {
        let target = &self.submission;

        page.fill_field(&target.answer_selector, text)
            .await
            .map_err(|source| SubmissionError::Fill {
                selector: target.answer_selector.clone(),
                source,
            })?;

        page.click_with_text(&target.confirm_selector, &target.confirm_text)
            .await
            .map_err(|source| SubmissionError::Confirm {
                selector: target.confirm_selector.clone(),
                text: target.confirm_text.clone(),
                source,
            })
    }
}
