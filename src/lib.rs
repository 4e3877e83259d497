//! Multi-step registration and booking wizard for the telehealth client.
//!
//! ARCHITECTURE
//! ============
//! - `validate`: pure per-field rules (required, pattern, min-length).
//! - `steps`: step tables per flow; registration branches on the selected role.
//! - `wizard`: the session state machine driven by UI events.
//! - `submit`: payload mapping and the HTTP submitter for the final step.
//! - `config`: environment-driven settings.
//!
//! Rendering, styling and the backend itself live elsewhere.

pub mod config;
pub mod form;
pub mod steps;
pub mod submit;
pub mod validate;
pub mod wizard;

pub use config::{ConfigError, WizardConfig};
pub use form::{FormState, FormValue};
pub use steps::{Flow, FlowKind, Role, StepDescriptor};
pub use submit::{Confirmation, HttpSubmitter, SubmissionError, SubmitRequest, Submitter};
pub use validate::{ErrorKind, FieldError, FieldErrors};
pub use wizard::{Advance, Phase, SubmitOutcome, WizardSession};
