//! Purchase flow driver.

use crate::error::{FlowError, Result};
use crate::outcome::FlowOutcome;
use crate::step::{FlowStep, ADD_CARD_LINK_TEXT, CONTINUE_BUTTON};
use buyer_browser::BrowserActions;
use buyer_captcha::{ChallengeResolver, ResolutionOutcome};
use buyer_core::{AppConfig, FlowConfig, PageUrl, Secret};
use std::time::Duration;
use tracing::{error, info, warn};

/// Runs the store → challenge → checkout sequence once.
#[derive(Debug, Clone)]
pub struct PurchaseFlow {
    config: FlowConfig,
    resolver: ChallengeResolver,
}

impl PurchaseFlow {
    /// Create a flow with an explicit resolver.
    #[must_use]
    pub fn new(config: FlowConfig, resolver: ChallengeResolver) -> Self {
        Self { config, resolver }
    }

    /// Create a flow with a Tesseract-backed resolver from the application config.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.flow.clone(), ChallengeResolver::from_config(config))
    }

    /// Run the whole flow under the configured deadline.
    ///
    /// Never fails: errors and the deadline are reported as outcomes.
    pub async fn run<P>(&self, page: &P) -> FlowOutcome
    where
        P: BrowserActions + ?Sized,
    {
        let deadline = Duration::from_secs(self.config.timeout_secs);

        match tokio::time::timeout(deadline, self.run_stages(page)).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                error!("Purchase flow aborted: {}", e);
                FlowOutcome::Aborted {
                    stage: e.stage(),
                    reason: e.to_string(),
                }
            }
            Err(_) => {
                error!(
                    "Purchase flow did not finish within {}s",
                    self.config.timeout_secs
                );
                FlowOutcome::TimedOut {
                    after_secs: self.config.timeout_secs,
                }
            }
        }
    }

    async fn run_stages<P>(&self, page: &P) -> Result<FlowOutcome>
    where
        P: BrowserActions + ?Sized,
    {
        Self::open(page, &self.config.home_url).await?;

        let captcha = self.resolver.resolve_challenge_if_present(page).await?;
        if let ResolutionOutcome::ManualInterventionRequired(reason) = captcha {
            warn!("Pausing purchase flow for manual intervention: {}", reason);
            return Ok(FlowOutcome::ManualInterventionRequired { reason });
        }

        Self::open(page, &self.config.product_url).await?;

        for step in FlowStep::ALL {
            self.run_step(page, step).await?;
            info!("Completed step {}", step);
        }

        info!("Purchase flow completed successfully");
        Ok(FlowOutcome::Completed { captcha })
    }

    async fn open<P>(page: &P, url: &PageUrl) -> Result<()>
    where
        P: BrowserActions + ?Sized,
    {
        page.navigate(url.as_str())
            .await
            .map_err(|source| FlowError::Navigation {
                url: url.to_string(),
                source,
            })
    }

    async fn run_step<P>(&self, page: &P, step: FlowStep) -> Result<()>
    where
        P: BrowserActions + ?Sized,
    {
        // Credentials are checked before touching the page
        let credential = match step {
            FlowStep::EnterEmail => Some(credential(step, "email", self.config.email.as_ref())?),
            FlowStep::EnterPassword => {
                Some(credential(step, "password", self.config.password.as_ref())?)
            }
            _ => None,
        };

        let on_err = |source| FlowError::Step { step, source };
        let timeout_ms = step.wait_timeout_ms(&self.config);
        match step.ready_text() {
            Some(text) => page.wait_for_text(step.ready_selector(), text, timeout_ms).await,
            None => page.wait_for_selector(step.ready_selector(), timeout_ms).await,
        }
        .map_err(on_err)?;

        match (step, credential) {
            (FlowStep::EnterEmail | FlowStep::EnterPassword, Some(secret)) => {
                page.fill_field(step.ready_selector(), secret.expose())
                    .await
                    .map_err(on_err)?;
                if step == FlowStep::EnterPassword {
                    page.click(CONTINUE_BUTTON).await.map_err(on_err)?;
                }
            }
            (FlowStep::AddPaymentCard, _) => {
                page.click_with_text(step.ready_selector(), ADD_CARD_LINK_TEXT)
                    .await
                    .map_err(on_err)?;
            }
            _ => {
                page.click(step.ready_selector()).await.map_err(on_err)?;
            }
        }
        Ok(())
    }
}

fn credential<'a>(step: FlowStep, field: &'static str, value: Option<&'a Secret>) -> Result<&'a Secret> {
    value.ok_or(FlowError::MissingCredential { step, field })
}
