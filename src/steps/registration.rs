//! Registration step table.

use super::{Role, StepDescriptor};
use crate::validate::{FieldSpec, Pattern, Rule};

pub(super) const STEP_COUNT: usize = 4;
pub(super) const ROLE_FIELD: &str = "role";

const ROLE_DETAILS: (&str, &str) = ("role_details", "Role Details");

pub(super) fn step(index: usize, role: Option<Role>, password_min_length: usize) -> StepDescriptor {
    match index {
        0 => account(password_min_length),
        1 => contact(),
        2 => role_details(role),
        _ => review(),
    }
}

fn account(password_min_length: usize) -> StepDescriptor {
    StepDescriptor::new(
        "account",
        "Account",
        vec![
            FieldSpec::required("fullName", "Full name"),
            FieldSpec::required("email", "Email").with(Rule::Pattern(Pattern::Email)),
            FieldSpec::required("password", "Password").with(Rule::MinLength(password_min_length)),
            FieldSpec::required(ROLE_FIELD, "Role").with(Rule::OneOf(Role::CHOICES)),
        ],
    )
}

fn contact() -> StepDescriptor {
    StepDescriptor::new(
        "contact",
        "Contact Details",
        vec![
            FieldSpec::required("phone", "Phone number").with(Rule::Pattern(Pattern::Phone)),
            FieldSpec::required("address", "Address"),
            FieldSpec::optional("dateOfBirth", "Date of birth").with(Rule::Pattern(Pattern::Date)),
            FieldSpec::optional("gender", "Gender"),
        ],
    )
}

fn role_details(role: Option<Role>) -> StepDescriptor {
    let (id, title) = ROLE_DETAILS;
    let Some(role) = role else {
        return StepDescriptor::placeholder(id, title);
    };

    let fields = match role {
        Role::Patient => vec![
            FieldSpec::required("emergencyContactName", "Emergency contact name"),
            FieldSpec::required("emergencyContactPhone", "Emergency contact phone").with(Rule::Pattern(Pattern::Phone)),
            FieldSpec::optional("emergencyContactRelationship", "Relationship"),
            FieldSpec::optional("insuranceProvider", "Insurance provider"),
            FieldSpec::optional("insurancePolicyNumber", "Policy number"),
        ],
        Role::Doctor => vec![
            FieldSpec::required("licenseNumber", "Medical license number").with(Rule::Pattern(Pattern::License)),
            FieldSpec::required("specialization", "Specialization"),
            FieldSpec::required("hospitalName", "Hospital"),
            FieldSpec::optional("hospitalAddress", "Hospital address"),
            FieldSpec::optional("yearsOfExperience", "Years of experience").with(Rule::Pattern(Pattern::Integer)),
            FieldSpec::required("bankAccountName", "Account holder name"),
            FieldSpec::required("bankAccountNumber", "Account number").with(Rule::Pattern(Pattern::Integer)),
            FieldSpec::optional("bankRoutingNumber", "Routing number").with(Rule::Pattern(Pattern::Integer)),
        ],
        Role::Pharmacist => vec![
            FieldSpec::required("licenseNumber", "Pharmacy license number").with(Rule::Pattern(Pattern::License)),
            FieldSpec::required("pharmacyName", "Pharmacy name"),
            FieldSpec::required("pharmacyAddress", "Pharmacy address"),
            FieldSpec::required("openingHours", "Opening hours").with(Rule::Pattern(Pattern::Hours)),
        ],
    };
    StepDescriptor::new(id, title, fields)
}

fn review() -> StepDescriptor {
    StepDescriptor::new(
        "review",
        "Review & Submit",
        vec![FieldSpec::required("acceptTerms", "Terms and conditions").with(Rule::Accepted)],
    )
}
