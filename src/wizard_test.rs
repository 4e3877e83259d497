use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::*;
use crate::validate::ErrorKind;

// =============================================================================
// FIXTURES
// =============================================================================

/// In-memory submitter that replays queued results and records requests.
#[derive(Default)]
struct FakeSubmitter {
    responses: Mutex<VecDeque<Result<Confirmation, SubmissionError>>>,
    calls: Mutex<Vec<SubmitRequest>>,
}

impl FakeSubmitter {
    fn replying(responses: Vec<Result<Confirmation, SubmissionError>>) -> Self {
        Self { responses: Mutex::new(responses.into()), calls: Mutex::default() }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Submitter for FakeSubmitter {
    async fn submit(&self, request: &SubmitRequest) -> Result<Confirmation, SubmissionError> {
        self.calls.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SubmissionError::Network("no response queued".into())))
    }
}

fn confirmed(token: &str) -> Result<Confirmation, SubmissionError> {
    Ok(Confirmation {
        token: Some(token.to_owned()),
        message: Some("Registered".into()),
        data: serde_json::json!({ "id": token }),
    })
}

fn patient_form() -> FormState {
    [
        ("fullName", "Jane Doe"),
        ("email", "Jane@Example.com"),
        ("password", "s3cretpass"),
        ("role", "patient"),
        ("phone", "+1 555-123-4567"),
        ("address", "1 Main St"),
        ("emergencyContactName", "Sam Doe"),
        ("emergencyContactPhone", "+1 555-987-6543"),
    ]
    .into_iter()
    .collect::<FormState>()
    .with("acceptTerms", true)
}

fn walk_to_last(session: &mut WizardSession) {
    while !session.is_last_step() {
        let from = session.current_step();
        assert_eq!(session.advance(), Advance::Moved { from, to: from + 1 });
    }
}

// =============================================================================
// ADVANCE
// =============================================================================

#[test]
fn new_session_starts_at_first_step() {
    let session = WizardSession::new(Flow::registration());
    assert_eq!(session.current_step(), 0);
    assert_eq!(session.progress(), (1, 4));
    assert!(session.form().is_empty());
    assert!(session.errors().is_empty());
    assert!(!session.is_validated());
    assert_eq!(session.phase(), Phase::Editing);
}

#[test]
fn blank_full_name_blocks_then_fixing_it_advances() {
    let mut session = WizardSession::new(Flow::registration());
    session.update_field("fullName", "");
    session.update_field("email", "jane@example.com");
    session.update_field("password", "s3cretpass");
    session.update_field("role", "patient");

    let Advance::Blocked(errors) = session.advance() else {
        panic!("expected advance to be blocked");
    };
    assert_eq!(session.current_step(), 0);
    assert!(session.is_validated());
    assert_eq!(errors["fullName"].kind, ErrorKind::Required);
    assert_eq!(session.visible_error("fullName").unwrap().kind, ErrorKind::Required);

    session.update_field("fullName", "Jane Doe");
    assert_eq!(session.advance(), Advance::Moved { from: 0, to: 1 });
    assert!(session.errors().is_empty());
    assert!(!session.is_validated());
}

#[test]
fn every_required_field_gates_its_step() {
    let full = patient_form();
    let flow = Flow::registration();

    for index in 0..flow.step_count() {
        for name in flow.resolve_for(index, &full).required_fields() {
            let mut session = WizardSession::with_form(flow, full.clone());
            for _ in 0..index {
                assert!(matches!(session.advance(), Advance::Moved { .. }));
            }

            let blank: FormValue = if name == "acceptTerms" { false.into() } else { "".into() };
            session.update_field(name, blank);
            let Advance::Blocked(errors) = session.advance() else {
                panic!("step {index} advanced without {name}");
            };
            assert!(errors.contains_key(name), "missing error for {name}");
            assert_eq!(session.current_step(), index);
        }
    }
}

#[test]
fn invalid_format_blocks_advance() {
    let mut session = WizardSession::with_form(Flow::registration(), patient_form().with("email", "not-an-email"));
    let Advance::Blocked(errors) = session.advance() else {
        panic!("expected advance to be blocked");
    };
    assert_eq!(errors.len(), 1);
    assert_eq!(errors["email"].kind, ErrorKind::InvalidFormat);
}

#[test]
fn short_password_blocks_with_configured_minimum() {
    let flow = Flow::registration().with_password_min_length(12);
    let mut session = WizardSession::with_form(flow, patient_form());
    let Advance::Blocked(errors) = session.advance() else {
        panic!("expected advance to be blocked");
    };
    assert_eq!(errors["password"].kind, ErrorKind::TooShort);
    assert_eq!(errors["password"].message, "Password must be at least 12 characters");
}

#[test]
fn password_with_trailing_space_counts_as_typed() {
    let mut session = WizardSession::with_form(Flow::registration(), patient_form().with("password", "abcdefg "));
    assert_eq!(session.advance(), Advance::Moved { from: 0, to: 1 });
}

#[test]
fn parenthesized_phone_numbers_advance() {
    let form = patient_form()
        .with("phone", "(555) 123-4567")
        .with("emergencyContactPhone", "(555) 987-6543");
    let mut session = WizardSession::with_form(Flow::registration(), form);
    walk_to_last(&mut session);
}

#[test]
fn consent_given_as_negative_text_blocks_submit() {
    for answer in ["false", "no", "maybe"] {
        let mut session = WizardSession::with_form(Flow::registration(), patient_form().with("acceptTerms", answer));
        walk_to_last(&mut session);
        let Advance::Blocked(errors) = session.advance() else {
            panic!("acceptTerms={answer:?} should block");
        };
        assert_eq!(errors["acceptTerms"].message, "Terms and conditions must be accepted");
        assert_eq!(session.phase(), Phase::Editing);
    }

    let mut session = WizardSession::with_form(Flow::registration(), patient_form().with("acceptTerms", "yes"));
    walk_to_last(&mut session);
    assert!(matches!(session.advance(), Advance::ReadyToSubmit(_)));
}

// =============================================================================
// RETREAT
// =============================================================================

#[test]
fn retreat_then_advance_keeps_data() {
    let mut session = WizardSession::with_form(Flow::registration(), patient_form());
    session.advance();
    session.advance();
    assert_eq!(session.current_step(), 2);
    let before = session.form().clone();

    assert!(session.retreat());
    assert_eq!(session.current_step(), 1);
    assert_eq!(session.form(), &before);

    assert_eq!(session.advance(), Advance::Moved { from: 1, to: 2 });
    assert_eq!(session.form(), &before);
}

#[test]
fn retreat_at_first_step_is_noop() {
    let mut session = WizardSession::new(Flow::registration());
    assert!(!session.retreat());
    assert_eq!(session.current_step(), 0);
}

#[test]
fn retreat_hides_stale_errors() {
    let mut session = WizardSession::with_form(Flow::registration(), patient_form());
    session.advance();
    session.update_field("phone", "");
    assert!(matches!(session.advance(), Advance::Blocked(_)));
    assert!(session.is_validated());

    assert!(session.retreat());
    assert!(!session.is_validated());
    assert!(session.errors().is_empty());
    assert!(session.visible_error("phone").is_none());
}

// =============================================================================
// UPDATE FIELD
// =============================================================================

#[test]
fn update_field_defers_validation_until_first_advance() {
    let mut session = WizardSession::new(Flow::registration());
    assert!(session.update_field("email", "bad"));
    assert!(session.errors().is_empty());
}

#[test]
fn update_field_revalidates_after_failed_advance() {
    let mut session = WizardSession::new(Flow::registration());
    session.advance();
    assert_eq!(session.errors()["email"].kind, ErrorKind::Required);

    session.update_field("email", "bad");
    assert_eq!(session.errors()["email"].kind, ErrorKind::InvalidFormat);

    session.update_field("email", "jane@example.com");
    assert!(!session.errors().contains_key("email"));
    assert!(session.errors().contains_key("fullName"));
}

#[test]
fn update_field_is_idempotent() {
    let mut session = WizardSession::new(Flow::registration());
    session.advance();

    assert!(session.update_field("email", "bad"));
    let form = session.form().clone();
    let errors = session.errors().clone();

    assert!(!session.update_field("email", "bad"));
    assert_eq!(session.form(), &form);
    assert_eq!(session.errors(), &errors);
}

#[test]
fn switching_role_ignores_previous_role_fields() {
    let mut session = WizardSession::with_form(Flow::registration(), patient_form());
    session.advance();
    session.advance();
    assert!(session.current_descriptor().has_field("emergencyContactName"));

    session.retreat();
    session.retreat();
    session.update_field("role", "doctor");
    walk_to(&mut session, 2);

    let descriptor = session.current_descriptor();
    assert!(descriptor.has_field("licenseNumber"));
    assert!(!descriptor.has_field("emergencyContactName"));

    let Advance::Blocked(errors) = session.advance() else {
        panic!("doctor details are empty");
    };
    assert!(errors.contains_key("licenseNumber"));
    assert!(!errors.contains_key("emergencyContactName"));
    assert_eq!(session.form().text("fullName").as_deref(), Some("Jane Doe"));
    assert_eq!(session.form().text("emergencyContactName").as_deref(), Some("Sam Doe"));
}

#[test]
fn switching_role_drops_errors_for_hidden_fields() {
    let mut session = WizardSession::with_form(Flow::registration(), patient_form());
    session.update_field("role", "doctor");
    walk_to(&mut session, 2);
    assert!(matches!(session.advance(), Advance::Blocked(_)));
    assert!(session.errors().contains_key("licenseNumber"));

    // The role field belongs to step 0 but stays editable from later steps.
    session.update_field("role", "patient");
    assert!(!session.errors().contains_key("licenseNumber"));
}

fn walk_to(session: &mut WizardSession, index: usize) {
    while session.current_step() < index {
        assert!(matches!(session.advance(), Advance::Moved { .. }));
    }
}

// =============================================================================
// SUBMISSION
// =============================================================================

#[test]
fn last_step_advance_hands_back_request_and_locks_session() {
    let mut session = WizardSession::with_form(Flow::registration(), patient_form());
    walk_to_last(&mut session);

    let Advance::ReadyToSubmit(request) = session.advance() else {
        panic!("expected a submit request");
    };
    assert_eq!(request.path, "/api/auth/register");
    assert_eq!(request.payload["email"], "jane@example.com");
    assert_eq!(session.phase(), Phase::Submitting);

    assert_eq!(session.advance(), Advance::Ignored);
    assert!(!session.update_field("fullName", "Someone Else"));
    assert!(!session.retreat());
}

#[test]
fn failed_submission_returns_to_editing_and_allows_retry() {
    let mut session = WizardSession::with_form(Flow::registration(), patient_form());
    walk_to_last(&mut session);
    let Advance::ReadyToSubmit(_) = session.advance() else {
        panic!("expected a submit request");
    };

    assert!(session.complete_submission(Err(SubmissionError::Server { status: 503 })));
    assert_eq!(session.phase(), Phase::Editing);
    assert!(session.is_last_step());
    assert!(session.submission_error().unwrap().retryable());

    assert!(matches!(session.advance(), Advance::ReadyToSubmit(_)));
    assert!(session.submission_error().is_none());
}

#[test]
fn complete_submission_without_request_is_rejected() {
    let mut session = WizardSession::new(Flow::registration());
    assert!(!session.complete_submission(confirmed("x")));
    assert_eq!(session.phase(), Phase::Editing);
    assert!(session.confirmation().is_none());
}

#[tokio::test]
async fn server_rejection_keeps_final_step_and_shows_message() {
    let submitter = FakeSubmitter::replying(vec![Err(SubmissionError::Rejected {
        status: 200,
        message: "Email already registered".into(),
    })]);
    let mut session = WizardSession::with_form(Flow::registration(), patient_form());
    walk_to_last(&mut session);
    let last = session.current_step();

    let outcome = session.submit(&submitter).await;
    assert!(matches!(outcome, SubmitOutcome::Failed(SubmissionError::Rejected { .. })));
    assert_eq!(session.current_step(), last);
    assert_eq!(session.phase(), Phase::Editing);
    assert!(!session.is_submitted());
    assert_eq!(session.banner().as_deref(), Some("Email already registered"));
    assert_eq!(session.form(), &patient_form());
}

#[tokio::test]
async fn successful_submission_is_terminal() {
    let submitter = FakeSubmitter::replying(vec![confirmed("user-42")]);
    let mut session = WizardSession::with_form(Flow::registration(), patient_form());
    walk_to_last(&mut session);

    let outcome = session.submit(&submitter).await;
    let SubmitOutcome::Confirmed(confirmation) = outcome else {
        panic!("expected confirmation");
    };
    assert_eq!(confirmation.token.as_deref(), Some("user-42"));
    assert!(session.is_submitted());
    assert_eq!(session.confirmation().unwrap().token.as_deref(), Some("user-42"));

    let form = session.form().clone();
    assert_eq!(session.advance(), Advance::Ignored);
    assert!(!session.update_field("fullName", "Changed"));
    assert!(!session.retreat());
    assert_eq!(session.submit(&submitter).await, SubmitOutcome::Ignored);
    assert_eq!(session.form(), &form);
    assert_eq!(submitter.call_count(), 1);
}

#[tokio::test]
async fn network_failure_shows_generic_banner() {
    let submitter = FakeSubmitter::replying(vec![Err(SubmissionError::Network("connection refused".into()))]);
    let mut session = WizardSession::with_form(Flow::registration(), patient_form());
    walk_to_last(&mut session);

    session.submit(&submitter).await;
    let banner = session.banner().unwrap();
    assert!(banner.contains("Unable to reach the server"));
    assert!(!banner.contains("connection refused"));
}

#[tokio::test]
async fn submit_before_last_step_is_ignored() {
    let submitter = FakeSubmitter::default();
    let mut session = WizardSession::with_form(Flow::registration(), patient_form());
    assert_eq!(session.submit(&submitter).await, SubmitOutcome::Ignored);
    assert_eq!(session.current_step(), 0);
    assert_eq!(submitter.call_count(), 0);
}

#[tokio::test]
async fn submit_without_consent_is_blocked_locally() {
    let submitter = FakeSubmitter::default();
    let mut session = WizardSession::with_form(Flow::registration(), patient_form().with("acceptTerms", false));
    walk_to_last(&mut session);

    let SubmitOutcome::Blocked(errors) = session.submit(&submitter).await else {
        panic!("expected local validation failure");
    };
    assert_eq!(errors["acceptTerms"].kind, ErrorKind::Required);
    assert_eq!(submitter.call_count(), 0);
    assert_eq!(session.phase(), Phase::Editing);
}

#[tokio::test]
async fn booking_flow_end_to_end() {
    let submitter = FakeSubmitter::replying(vec![confirmed("appt-7")]);
    let mut session = WizardSession::new(Flow::booking());

    session.update_field("specialty", "Cardiology");
    session.update_field("doctorId", "doc-1");
    assert!(matches!(session.advance(), Advance::Moved { .. }));

    session.update_field("date", "2025-02-30");
    session.update_field("time", "10:30");
    let Advance::Blocked(errors) = session.advance() else {
        panic!("invalid date accepted");
    };
    assert_eq!(errors["date"].kind, ErrorKind::InvalidFormat);
    session.update_field("date", "2025-03-03");
    assert!(session.errors().is_empty());
    assert!(matches!(session.advance(), Advance::Moved { .. }));

    session.update_field("reason", "Chest pain follow-up");
    session.update_field("consultationMode", "video");
    assert!(matches!(session.advance(), Advance::Moved { .. }));

    session.update_field("confirmBooking", true);
    assert!(matches!(session.submit(&submitter).await, SubmitOutcome::Confirmed(_)));

    let calls = submitter.calls.lock().unwrap();
    assert_eq!(calls[0].path, "/api/appointments");
    assert_eq!(calls[0].payload["doctorId"], "doc-1");
    assert!(calls[0].payload.get("confirmBooking").is_none());
}
