//! Checkout steps after the store page.

use buyer_core::FlowConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sign-in / continue button shared by several steps.
pub const CONTINUE_BUTTON: &str = ".a-button-input";

/// Link opening the payment card form.
pub const ADD_CARD_LINK_TEXT: &str = "Add a credit or debit card";

/// One step of the checkout, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowStep {
    /// Put the product into the cart
    AddToCart,
    /// Leave the cart for checkout
    ProceedToCheckout,
    /// Type the account email
    EnterEmail,
    /// Submit the email form
    ContinueSignIn,
    /// Type the password and sign in
    EnterPassword,
    /// Open the payment card form
    AddPaymentCard,
}

impl FlowStep {
    /// All steps in the order they run.
    pub const ALL: [FlowStep; 6] = [
        Self::AddToCart,
        Self::ProceedToCheckout,
        Self::EnterEmail,
        Self::ContinueSignIn,
        Self::EnterPassword,
        Self::AddPaymentCard,
    ];

    /// Stable kebab-case name used in logs and outcomes.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::AddToCart => "add-to-cart",
            Self::ProceedToCheckout => "proceed-to-checkout",
            Self::EnterEmail => "enter-email",
            Self::ContinueSignIn => "continue-sign-in",
            Self::EnterPassword => "enter-password",
            Self::AddPaymentCard => "add-payment-card",
        }
    }

    /// Selector that must appear before the step can act.
    #[must_use]
    pub fn ready_selector(self) -> &'static str {
        match self {
            Self::AddToCart => "#add-to-cart-button",
            Self::ProceedToCheckout => r#"input[value="Proceed to checkout"]"#,
            Self::EnterEmail => r#"input[name="email"]"#,
            Self::ContinueSignIn => CONTINUE_BUTTON,
            Self::EnterPassword => "#ap_password",
            Self::AddPaymentCard => "a",
        }
    }

    /// Text the ready element must contain, when the selector alone is too broad.
    #[must_use]
    pub fn ready_text(self) -> Option<&'static str> {
        match self {
            Self::AddPaymentCard => Some(ADD_CARD_LINK_TEXT),
            _ => None,
        }
    }

    /// How long to wait for the ready element.
    ///
    /// Steps that act right after a click on the same page use the short
    /// step timeout; steps waiting on a fresh page load use the page timeout.
    #[must_use]
    pub fn wait_timeout_ms(self, config: &FlowConfig) -> u64 {
        match self {
            Self::AddToCart | Self::EnterPassword | Self::AddPaymentCard => config.step_timeout_ms,
            Self::ProceedToCheckout | Self::EnterEmail | Self::ContinueSignIn => {
                config.page_timeout_ms
            }
        }
    }
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_names_unique() {
        let mut names: Vec<_> = FlowStep::ALL.iter().map(|s| s.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), FlowStep::ALL.len());
    }

    #[test]
    fn test_only_payment_link_needs_text() {
        assert_eq!(FlowStep::AddPaymentCard.ready_text(), Some(ADD_CARD_LINK_TEXT));
        assert!(FlowStep::ALL[..5].iter().all(|step| step.ready_text().is_none()));
    }

    #[test]
    fn test_wait_timeouts() {
        let config = FlowConfig {
            step_timeout_ms: 10_000,
            page_timeout_ms: 30_000,
            ..FlowConfig::default()
        };
        assert_eq!(FlowStep::AddToCart.wait_timeout_ms(&config), 10_000);
        assert_eq!(FlowStep::ProceedToCheckout.wait_timeout_ms(&config), 30_000);
        assert_eq!(FlowStep::EnterEmail.wait_timeout_ms(&config), 30_000);
        assert_eq!(FlowStep::EnterPassword.wait_timeout_ms(&config), 10_000);
        assert_eq!(FlowStep::AddPaymentCard.wait_timeout_ms(&config), 10_000);
    }

    #[test]
    fn test_order_starts_with_cart() {
        assert_eq!(FlowStep::ALL[0], FlowStep::AddToCart);
        assert_eq!(FlowStep::ALL[5], FlowStep::AddPaymentCard);
        assert_eq!(FlowStep::EnterPassword.to_string(), "enter-password");
    }
}
