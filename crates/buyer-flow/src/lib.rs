//! Buyer Flow - the scripted purchase sequence around the CAPTCHA resolver.
//!
//! The flow visits the store, resolves a challenge if one is shown, then
//! walks the checkout steps in order. Any failing step ends the run; a
//! challenge that needs a human ends it with
//! [`FlowOutcome::ManualInterventionRequired`] so the operator can take over.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod driver;
pub mod error;
pub mod outcome;
pub mod step;

pub use driver::PurchaseFlow;
pub use error::{FlowError, Result};
pub use outcome::FlowOutcome;
pub use step::FlowStep;

pub use buyer_captcha::{ManualInterventionReason, ResolutionOutcome};
