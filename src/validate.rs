//! Field validation rules.
//!
//! Every field carries one explicit rule list. Checks are pure: they look at
//! a single value and return the first failing rule as a [`FieldError`].

#[cfg(test)]
#[path = "validate_test.rs"]
mod validate_test;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::form::{FormState, FormValue};

/// Errors for one validation pass, keyed by field name.
pub type FieldErrors = BTreeMap<String, FieldError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    Required,
    InvalidFormat,
    TooShort,
}

/// A failed check on one field, with a message ready for inline display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub kind: ErrorKind,
    pub message: String,
}

// =============================================================================
// PATTERNS
// =============================================================================

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$"));
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"^\+?\(?[0-9][0-9 ()-]{5,18}[0-9]$"));
static LICENSE_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"^[A-Za-z0-9][A-Za-z0-9-]{4,19}$"));
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"^(\d{4})-(\d{2})-(\d{2})$"));
static TIME_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"^([01]\d|2[0-3]):[0-5]\d$"));
static INTEGER_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"^\d+$"));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in pattern must compile")
}

/// Closed set of value formats a field can be held to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Email,
    Phone,
    License,
    /// `YYYY-MM-DD`, and the day must exist in that month.
    Date,
    /// 24-hour `HH:MM`.
    Time,
    /// `HH:MM-HH:MM`, opening before closing.
    Hours,
    /// Non-negative whole number.
    Integer,
}

impl Pattern {
    #[must_use]
    pub fn matches(self, value: &str) -> bool {
        match self {
            Self::Email => EMAIL_RE.is_match(value),
            Self::Phone => PHONE_RE.is_match(value),
            Self::License => LICENSE_RE.is_match(value),
            Self::Date => is_calendar_date(value),
            Self::Time => TIME_RE.is_match(value),
            Self::Hours => is_hours_range(value),
            Self::Integer => INTEGER_RE.is_match(value),
        }
    }

    fn message(self, label: &str) -> String {
        match self {
            Self::Email => "Enter a valid email address".to_owned(),
            Self::Phone => "Enter a valid phone number".to_owned(),
            Self::License => "Enter a valid license number".to_owned(),
            Self::Date => "Enter a valid date (YYYY-MM-DD)".to_owned(),
            Self::Time => "Enter a valid time (HH:MM)".to_owned(),
            Self::Hours => "Enter opening hours as HH:MM-HH:MM".to_owned(),
            Self::Integer => format!("{label} must be a whole number"),
        }
    }
}

fn is_calendar_date(value: &str) -> bool {
    let Some(caps) = DATE_RE.captures(value) else {
        return false;
    };
    let (Ok(year), Ok(month), Ok(day)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>(), caps[3].parse::<u32>()) else {
        return false;
    };
    (1..=12).contains(&month) && day >= 1 && day <= days_in_month(year, month)
}

fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        2 if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

fn is_hours_range(value: &str) -> bool {
    let Some((open, close)) = value.split_once('-') else {
        return false;
    };
    let (open, close) = (open.trim(), close.trim());
    TIME_RE.is_match(open) && TIME_RE.is_match(close) && open < close
}

// =============================================================================
// RULES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Required,
    /// Consent: a true checkbox or an affirmative text value.
    Accepted,
    Pattern(Pattern),
    /// Case-insensitive match against a fixed list of choices.
    OneOf(&'static [&'static str]),
    /// Minimum length in characters, counted on the text as typed.
    MinLength(usize),
}

/// One form field: its name, display label, and the full rule list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub rules: Vec<Rule>,
}

impl FieldSpec {
    #[must_use]
    pub fn required(name: &'static str, label: &'static str) -> Self {
        Self { name, label, rules: vec![Rule::Required] }
    }

    #[must_use]
    pub fn optional(name: &'static str, label: &'static str) -> Self {
        Self { name, label, rules: Vec::new() }
    }

    #[must_use]
    pub fn with(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.rules.contains(&Rule::Required)
    }

    /// Run the rules against `value`. Blank optional fields always pass.
    #[must_use]
    pub fn check(&self, value: Option<&FormValue>) -> Option<FieldError> {
        let value = match value {
            Some(v) if !v.is_blank() => v,
            blank => {
                if !self.is_required() {
                    return None;
                }
                let message = if matches!(blank, Some(FormValue::Bool(false))) {
                    format!("{} must be accepted", self.label)
                } else {
                    format!("{} is required", self.label)
                };
                return Some(FieldError { kind: ErrorKind::Required, message });
            }
        };

        self.rules.iter().find_map(|rule| check_rule(self.label, rule, value))
    }
}

fn check_rule(label: &str, rule: &Rule, value: &FormValue) -> Option<FieldError> {
    match rule {
        Rule::Required => None,
        Rule::Accepted => (value.as_bool() != Some(true)).then(|| FieldError {
            kind: ErrorKind::Required,
            message: format!("{label} must be accepted"),
        }),
        Rule::Pattern(pattern) => {
            let text = value.to_text()?;
            (!pattern.matches(&text))
                .then(|| FieldError { kind: ErrorKind::InvalidFormat, message: pattern.message(label) })
        }
        Rule::OneOf(choices) => {
            let text = value.to_text()?;
            (!choices.iter().any(|c| c.eq_ignore_ascii_case(&text))).then(|| FieldError {
                kind: ErrorKind::InvalidFormat,
                message: format!("{label} must be one of: {}", choices.join(", ")),
            })
        }
        Rule::MinLength(min) => {
            let len = match value {
                FormValue::Text(s) => s.chars().count(),
                other => other.to_text()?.chars().count(),
            };
            (len < *min).then(|| FieldError {
                kind: ErrorKind::TooShort,
                message: format!("{label} must be at least {min} characters"),
            })
        }
    }
}

// =============================================================================
// RULESET
// =============================================================================

/// The consolidated rule table for a set of fields (usually one step).
#[derive(Debug, Clone, Copy)]
pub struct Ruleset<'a> {
    fields: &'a [FieldSpec],
}

impl<'a> Ruleset<'a> {
    #[must_use]
    pub fn new(fields: &'a [FieldSpec]) -> Self {
        Self { fields }
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'a FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validate every field against `form`. Valid fields are absent from the result.
    #[must_use]
    pub fn validate_all(&self, form: &FormState) -> FieldErrors {
        self.fields
            .iter()
            .filter_map(|f| f.check(form.get(f.name)).map(|e| (f.name.to_owned(), e)))
            .collect()
    }
}

/// Validate one field value against `ruleset`. Fields the ruleset does not
/// know are treated as valid.
#[must_use]
pub fn validate(field_name: &str, value: Option<&FormValue>, ruleset: &Ruleset<'_>) -> Option<FieldError> {
    ruleset.field(field_name)?.check(value)
}
