//! Wizard controller: step index, form record, field errors and submission phase.
//!
//! DESIGN
//! ======
//! A session walks `Step[0] .. Step[N-1]` and ends in `Submitted`. Moving
//! forward validates the current resolved step; moving back never loses
//! data. The last forward move hands a [`SubmitRequest`] to the caller and
//! parks the session in `Submitting` until [`WizardSession::complete_submission`]
//! reports the outcome, which keeps at most one submission in flight.
//!
//! Errors are only shown once the user has tried to move forward
//! (`validated`). From then on every edit re-checks its own field so the
//! inline message tracks the input.

#[cfg(test)]
#[path = "wizard_test.rs"]
mod wizard_test;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::form::{FormState, FormValue};
use crate::steps::{Flow, Role, StepDescriptor};
use crate::submit::{self, Confirmation, SubmissionError, SubmitRequest, Submitter};
use crate::validate::{FieldError, FieldErrors, validate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Accepting input on the current step.
    Editing,
    /// Final request in flight; input and navigation are disabled.
    Submitting,
    /// Terminal.
    Submitted,
}

/// Result of [`WizardSession::advance`].
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// The current step has invalid fields; the session did not move.
    Blocked(FieldErrors),
    Moved { from: usize, to: usize },
    /// The last step passed validation. Deliver the request, then call
    /// [`WizardSession::complete_submission`].
    ReadyToSubmit(SubmitRequest),
    /// The session is submitting or already submitted.
    Ignored,
}

/// Result of [`WizardSession::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Confirmed(Confirmation),
    Failed(SubmissionError),
    Blocked(FieldErrors),
    /// Not on the last step, or not in a state that accepts a submission.
    Ignored,
}

/// One user's pass through a wizard flow.
#[derive(Debug, Clone)]
pub struct WizardSession {
    id: Uuid,
    flow: Flow,
    current: usize,
    form: FormState,
    errors: FieldErrors,
    validated: bool,
    phase: Phase,
    submission_error: Option<SubmissionError>,
    confirmation: Option<Confirmation>,
}

impl WizardSession {
    #[must_use]
    pub fn new(flow: Flow) -> Self {
        Self::with_form(flow, FormState::new())
    }

    /// Start a session with pre-filled values (e.g. a logged-in user's email).
    #[must_use]
    pub fn with_form(flow: Flow, form: FormState) -> Self {
        let id = Uuid::new_v4();
        info!(session_id = %id, flow = ?flow.kind(), steps = flow.step_count(), "wizard: session started");
        Self {
            id,
            flow,
            current: 0,
            form,
            errors: FieldErrors::new(),
            validated: false,
            phase: Phase::Editing,
            submission_error: None,
            confirmation: None,
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn flow(&self) -> &Flow {
        &self.flow
    }

    #[must_use]
    pub fn current_step(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn step_count(&self) -> usize {
        self.flow.step_count()
    }

    /// One-based `(step, of)` for progress indicators.
    #[must_use]
    pub fn progress(&self) -> (usize, usize) {
        (self.current + 1, self.step_count())
    }

    #[must_use]
    pub fn is_last_step(&self) -> bool {
        self.current + 1 == self.step_count()
    }

    #[must_use]
    pub fn discriminator(&self) -> Option<Role> {
        self.flow.discriminator(&self.form)
    }

    #[must_use]
    pub fn current_descriptor(&self) -> StepDescriptor {
        self.flow.resolve_for(self.current, &self.form)
    }

    #[must_use]
    pub fn form(&self) -> &FormState {
        &self.form
    }

    #[must_use]
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Inline error for `name`, hidden until the user has tried to advance.
    #[must_use]
    pub fn visible_error(&self, name: &str) -> Option<&FieldError> {
        if self.validated { self.errors.get(name) } else { None }
    }

    #[must_use]
    pub fn is_validated(&self) -> bool {
        self.validated
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.phase == Phase::Submitted
    }

    #[must_use]
    pub fn submission_error(&self) -> Option<&SubmissionError> {
        self.submission_error.as_ref()
    }

    /// Step-level message after a failed submission.
    #[must_use]
    pub fn banner(&self) -> Option<String> {
        self.submission_error.as_ref().map(SubmissionError::user_message)
    }

    #[must_use]
    pub fn confirmation(&self) -> Option<&Confirmation> {
        self.confirmation.as_ref()
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    /// Set a field. Returns `true` if the form changed.
    ///
    /// Ignored while submitting or after submission. Once the user has tried
    /// to advance, the edited field is re-validated immediately.
    pub fn update_field(&mut self, name: &str, value: impl Into<FormValue>) -> bool {
        if self.phase != Phase::Editing {
            debug!(session_id = %self.id, field = name, phase = ?self.phase, "wizard: update ignored");
            return false;
        }

        let value = value.into();
        if self.form.get(name) == Some(&value) {
            return false;
        }
        self.form = self.form.with(name, value);

        let descriptor = self.current_descriptor();
        if self.flow.discriminator_field() == Some(name) {
            self.errors.retain(|field, _| descriptor.has_field(field));
        }
        if self.validated {
            match validate(name, self.form.get(name), &descriptor.ruleset()) {
                Some(err) => {
                    self.errors.insert(name.to_owned(), err);
                }
                None => {
                    self.errors.remove(name);
                }
            }
        }
        true
    }

    /// Validate the current step and move forward, or hand back the final request.
    pub fn advance(&mut self) -> Advance {
        if self.phase != Phase::Editing {
            debug!(session_id = %self.id, phase = ?self.phase, "wizard: advance ignored");
            return Advance::Ignored;
        }

        let descriptor = self.current_descriptor();
        let errors = descriptor.ruleset().validate_all(&self.form);
        if !errors.is_empty() {
            debug!(session_id = %self.id, step = descriptor.id, invalid = errors.len(), "wizard: advance blocked");
            self.validated = true;
            self.errors.clone_from(&errors);
            return Advance::Blocked(errors);
        }

        self.errors.clear();
        self.validated = false;

        if self.is_last_step() {
            let request = submit::build_request(&self.flow, &self.form);
            self.phase = Phase::Submitting;
            self.submission_error = None;
            info!(session_id = %self.id, path = request.path, "wizard: submitting");
            return Advance::ReadyToSubmit(request);
        }

        let from = self.current;
        self.current += 1;
        debug!(session_id = %self.id, from, to = self.current, "wizard: step advanced");
        Advance::Moved { from, to: self.current }
    }

    /// Step back one step, keeping all entered data. Returns `true` if the session moved.
    pub fn retreat(&mut self) -> bool {
        if self.phase != Phase::Editing || self.current == 0 {
            return false;
        }
        self.current -= 1;
        self.validated = false;
        self.errors.clear();
        self.submission_error = None;
        debug!(session_id = %self.id, to = self.current, "wizard: step retreated");
        true
    }

    /// Record the outcome of the request returned by [`Self::advance`].
    /// Returns `false` if no submission was in flight.
    pub fn complete_submission(&mut self, result: Result<Confirmation, SubmissionError>) -> bool {
        if self.phase != Phase::Submitting {
            warn!(session_id = %self.id, phase = ?self.phase, "wizard: unexpected submission result");
            return false;
        }

        match result {
            Ok(confirmation) => {
                info!(session_id = %self.id, token = ?confirmation.token, "wizard: submitted");
                self.phase = Phase::Submitted;
                self.confirmation = Some(confirmation);
            }
            Err(e) => {
                warn!(session_id = %self.id, error = %e, code = e.error_code(), "wizard: submission failed");
                self.phase = Phase::Editing;
                self.submission_error = Some(e);
            }
        }
        true
    }

    /// Validate the last step, send it through `submitter`, and apply the result.
    pub async fn submit(&mut self, submitter: &dyn Submitter) -> SubmitOutcome {
        if self.phase != Phase::Editing || !self.is_last_step() {
            return SubmitOutcome::Ignored;
        }

        let request = match self.advance() {
            Advance::ReadyToSubmit(request) => request,
            Advance::Blocked(errors) => return SubmitOutcome::Blocked(errors),
            Advance::Moved { .. } | Advance::Ignored => return SubmitOutcome::Ignored,
        };

        let result = submitter.submit(&request).await;
        self.complete_submission(result.clone());
        match result {
            Ok(confirmation) => SubmitOutcome::Confirmed(confirmation),
            Err(e) => SubmitOutcome::Failed(e),
        }
    }
}
