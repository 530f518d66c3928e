//! Resolution outcomes handed back to the purchase flow.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a human has to take over.
///
/// The detail strings are for operators and logs only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "detail", rename_all = "kebab-case")]
pub enum ManualInterventionReason {
    /// The challenge could not be brought on screen
    Visibility(String),

    /// The challenge could not be snapshotted
    Capture(String),

    /// OCR produced no text
    EmptyExtraction,
}

impl ManualInterventionReason {
    /// Short stable name: `visibility`, `capture` or `empty-extraction`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Visibility(_) => "visibility",
            Self::Capture(_) => "capture",
            Self::EmptyExtraction => "empty-extraction",
        }
    }

    /// Underlying error text, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Visibility(detail) | Self::Capture(detail) => Some(detail),
            Self::EmptyExtraction => None,
        }
    }
}

impl fmt::Display for ManualInterventionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.detail() {
            Some(detail) => write!(f, "{} ({})", self.as_str(), detail),
            None => f.write_str(self.as_str()),
        }
    }
}

/// Terminal result of one resolution attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// The page showed no challenge
    NoChallengePresent,

    /// Text was recognized and submitted (submission is best-effort)
    Resolved(String),

    /// Automation must pause for an operator
    ManualInterventionRequired(ManualInterventionReason),
}

impl ResolutionOutcome {
    /// Check if the flow may carry on automatically
    #[must_use]
    pub fn can_continue(&self) -> bool {
        !self.requires_manual_intervention()
    }

    /// Check if an operator has to act
    #[must_use]
    pub fn requires_manual_intervention(&self) -> bool {
        matches!(self, Self::ManualInterventionRequired(_))
    }

    /// Short reason name when manual intervention is required
    #[must_use]
    pub fn manual_reason(&self) -> Option<&'static str> {
        match self {
            Self::ManualInterventionRequired(reason) => Some(reason.as_str()),
            _ => None,
        }
    }

    /// Submitted text when resolved
    #[must_use]
    pub fn resolved_text(&self) -> Option<&str> {
        match self {
            Self::Resolved(text) => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_continue() {
        assert!(ResolutionOutcome::NoChallengePresent.can_continue());
        assert!(ResolutionOutcome::Resolved("AB12".to_string()).can_continue());

        let outcome = ResolutionOutcome::ManualInterventionRequired(
            ManualInterventionReason::EmptyExtraction,
        );
        assert!(!outcome.can_continue());
        assert_eq!(outcome.manual_reason(), Some("empty-extraction"));
    }

    #[test]
    fn test_reason_display() {
        let reason = ManualInterventionReason::Capture("timeout: form img".to_string());
        assert_eq!(reason.to_string(), "capture (timeout: form img)");
        assert_eq!(ManualInterventionReason::EmptyExtraction.to_string(), "empty-extraction");
    }

    #[test]
    fn test_resolved_text() {
        let outcome = ResolutionOutcome::Resolved("XY7Q".to_string());
        assert_eq!(outcome.resolved_text(), Some("XY7Q"));
        assert_eq!(outcome.manual_reason(), None);
        assert_eq!(ResolutionOutcome::NoChallengePresent.resolved_text(), None);
    }
}
