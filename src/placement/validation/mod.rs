//! Transition validation.
//!
//! The allow-list in [`rules`] declares, for every entity kind, which status
//! changes exist, who may trigger them, which dates gate them, and which side
//! effects they carry. [`validate`] checks a request against it without
//! touching any state.

pub mod rules;
mod validator;

pub use rules::{Audience, Effect, Gate, Party, TRANSITION_TABLE, TransitionRule};
pub use validator::{RejectionReason, TransitionPlan, TransitionRequest, validate};
