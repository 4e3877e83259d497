//! Appointment booking step table.

use super::StepDescriptor;
use crate::validate::{FieldSpec, Pattern, Rule};

pub(super) const STEP_COUNT: usize = 4;

const CONSULTATION_MODES: &[&str] = &["video", "audio", "in_person"];

pub(super) fn step(index: usize) -> StepDescriptor {
    match index {
        0 => StepDescriptor::new(
            "doctor",
            "Choose a Doctor",
            vec![FieldSpec::required("specialty", "Specialty"), FieldSpec::required("doctorId", "Doctor")],
        ),
        1 => StepDescriptor::new(
            "schedule",
            "Date & Time",
            vec![
                FieldSpec::required("date", "Date").with(Rule::Pattern(Pattern::Date)),
                FieldSpec::required("time", "Time").with(Rule::Pattern(Pattern::Time)),
            ],
        ),
        2 => StepDescriptor::new(
            "details",
            "Visit Details",
            vec![
                FieldSpec::required("reason", "Reason for visit"),
                FieldSpec::required("consultationMode", "Consultation mode").with(Rule::OneOf(CONSULTATION_MODES)),
                FieldSpec::optional("symptoms", "Symptoms"),
            ],
        ),
        _ => StepDescriptor::new(
            "review",
            "Review & Confirm",
            vec![FieldSpec::required("confirmBooking", "Booking confirmation").with(Rule::Accepted)],
        ),
    }
}
