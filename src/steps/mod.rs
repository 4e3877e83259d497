//! Step content for the registration and booking flows.
//!
//! DESIGN
//! ======
//! Both flows are fixed, ordered step tables. Registration branches its
//! role-details step on the selected [`Role`]; the branch is a closed enum
//! match, so adding a role means adding a match arm, not a plugin.
//!
//! A discriminator-dependent step resolved before a role is chosen yields a
//! placeholder descriptor with no fields rather than an error.


mod booking;
mod registration;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::form::FormState;
use crate::validate::{FieldSpec, Ruleset};

pub const DEFAULT_PASSWORD_MIN_LENGTH: usize = 8;

// =============================================================================
// ROLE
// =============================================================================

/// The registration discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
    Pharmacist,
}

impl Role {
    pub const CHOICES: &'static [&'static str] = &["patient", "doctor", "pharmacist"];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Doctor => "doctor",
            Self::Pharmacist => "pharmacist",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "patient" => Ok(Self::Patient),
            "doctor" => Ok(Self::Doctor),
            "pharmacist" => Ok(Self::Pharmacist),
            other => Err(UnknownRole(other.to_owned())),
        }
    }
}

// =============================================================================
// STEP DESCRIPTOR
// =============================================================================

/// The fields shown (and validated) on one wizard step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDescriptor {
    pub id: &'static str,
    pub title: &'static str,
    pub fields: Vec<FieldSpec>,
}

impl StepDescriptor {
    #[must_use]
    pub fn new(id: &'static str, title: &'static str, fields: Vec<FieldSpec>) -> Self {
        Self { id, title, fields }
    }

    /// Descriptor with no fields, used while the discriminator is unset.
    #[must_use]
    pub fn placeholder(id: &'static str, title: &'static str) -> Self {
        Self { id, title, fields: Vec::new() }
    }

    #[must_use]
    pub fn ruleset(&self) -> Ruleset<'_> {
        Ruleset::new(&self.fields)
    }

    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    #[must_use]
    pub fn required_fields(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| f.is_required())
            .map(|f| f.name)
            .collect()
    }
}

// =============================================================================
// FLOW
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowKind {
    Registration,
    Booking,
}

/// A wizard flow: which step table to use, plus the rule knobs it depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flow {
    kind: FlowKind,
    password_min_length: usize,
}

impl Flow {
    #[must_use]
    pub fn new(kind: FlowKind) -> Self {
        Self { kind, password_min_length: DEFAULT_PASSWORD_MIN_LENGTH }
    }

    #[must_use]
    pub fn registration() -> Self {
        Self::new(FlowKind::Registration)
    }

    #[must_use]
    pub fn booking() -> Self {
        Self::new(FlowKind::Booking)
    }

    #[must_use]
    pub fn with_password_min_length(mut self, min: usize) -> Self {
        self.password_min_length = min.max(1);
        self
    }

    #[must_use]
    pub fn kind(&self) -> FlowKind {
        self.kind
    }

    #[must_use]
    pub fn password_min_length(&self) -> usize {
        self.password_min_length
    }

    #[must_use]
    pub fn step_count(&self) -> usize {
        match self.kind {
            FlowKind::Registration => registration::STEP_COUNT,
            FlowKind::Booking => booking::STEP_COUNT,
        }
    }

    /// Backend path the final payload is posted to.
    #[must_use]
    pub fn endpoint(&self) -> &'static str {
        match self.kind {
            FlowKind::Registration => "/api/auth/register",
            FlowKind::Booking => "/api/appointments",
        }
    }

    /// Name of the form field whose value selects step content, if any.
    #[must_use]
    pub fn discriminator_field(&self) -> Option<&'static str> {
        match self.kind {
            FlowKind::Registration => Some(registration::ROLE_FIELD),
            FlowKind::Booking => None,
        }
    }

    /// Read the discriminator from `form`. Unknown role text counts as unset.
    #[must_use]
    pub fn discriminator(&self, form: &FormState) -> Option<Role> {
        let field = self.discriminator_field()?;
        form.text(field)?.parse().ok()
    }

    /// Resolve the descriptor for `index`. Indices past the end clamp to the
    /// last step.
    #[must_use]
    pub fn resolve_step(&self, index: usize, discriminator: Option<Role>) -> StepDescriptor {
        let index = index.min(self.step_count() - 1);
        match self.kind {
            FlowKind::Registration => registration::step(index, discriminator, self.password_min_length),
            FlowKind::Booking => booking::step(index),
        }
    }

    /// Resolve `index` using the discriminator currently held in `form`.
    #[must_use]
    pub fn resolve_for(&self, index: usize, form: &FormState) -> StepDescriptor {
        self.resolve_step(index, self.discriminator(form))
    }
}
