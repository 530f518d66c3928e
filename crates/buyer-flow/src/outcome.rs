//! Purchase flow outcomes.

use buyer_captcha::{ManualInterventionReason, ResolutionOutcome};
use serde::{Deserialize, Serialize};

/// How a purchase flow run ended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FlowOutcome {
    /// Every step ran
    Completed {
        /// What happened at the challenge checkpoint
        captcha: ResolutionOutcome,
    },

    /// The challenge needs a human; nothing after it ran
    ManualInterventionRequired {
        /// Reason reported by the resolver
        reason: ManualInterventionReason,
    },

    /// A stage failed and the run stopped there
    Aborted {
        /// Stage name (`navigate`, `captcha` or a step name)
        stage: String,
        /// Human-readable failure reason
        reason: String,
    },

    /// The flow deadline elapsed
    TimedOut {
        /// Deadline in seconds
        after_secs: u64,
    },
}

impl FlowOutcome {
    /// Check if the outcome is successful
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Check if the outcome requires user action
    #[must_use]
    pub fn requires_user_action(&self) -> bool {
        matches!(self, Self::ManualInterventionRequired { .. })
    }

    /// Check if the outcome is a failure
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Aborted { .. } | Self::TimedOut { .. })
    }
}
