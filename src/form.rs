//! Form values and the in-progress form record.
//!
//! DESIGN
//! ======
//! `FormState` is an immutable record: `with` hands back an updated copy and
//! leaves the receiver untouched. The wizard swaps its record on every edit,
//! so step navigation never has to reason about partially mutated state.

#[cfg(test)]
#[path = "form_test.rs"]
mod form_test;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Number;

// =============================================================================
// FORM VALUE
// =============================================================================

/// A single field value as entered by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    Bool(bool),
    /// Kept as parsed so long identifiers survive without float rounding.
    Number(Number),
    Text(String),
    Object(BTreeMap<String, FormValue>),
}

impl FormValue {
    /// `true` for whitespace-only text, `false` booleans and empty objects.
    /// Numbers are never blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::Bool(b) => !b,
            Self::Number(_) => false,
            Self::Object(map) => map.values().all(Self::is_blank),
        }
    }

    /// Trimmed textual rendering used by pattern and length rules.
    /// Objects have no textual form.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.trim().to_owned()),
            Self::Number(n) => Some(n.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Object(_) => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" => Some(true),
                "false" | "no" | "off" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FormValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<u32> for FormValue {
    fn from(value: u32) -> Self {
        Self::Number(value.into())
    }
}

impl From<u64> for FormValue {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

// =============================================================================
// FORM STATE
// =============================================================================

/// Accumulated field values for one wizard session, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormState {
    fields: BTreeMap<String, FormValue>,
}

impl FormState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy of this record with `name` set to `value`.
    #[must_use]
    pub fn with(&self, name: &str, value: impl Into<FormValue>) -> Self {
        let mut fields = self.fields.clone();
        fields.insert(name.to_owned(), value.into());
        Self { fields }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.fields.get(name)
    }

    /// Trimmed, non-empty text for `name`. Numbers are rendered as text.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<String> {
        self.get(name)
            .filter(|v| !v.is_blank())
            .and_then(FormValue::to_text)
            .filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<FormValue>> FromIterator<(K, V)> for FormState {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}
