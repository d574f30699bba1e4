//! Field validation for submitted forms.
//!
//! A [`Validator`] is embedded in every form struct and accumulates the errors
//! for one submission. Field errors follow "first error wins": once a message
//! is recorded for a field, later checks against the same field are ignored.
//! The free functions are the predicates handlers feed into
//! [`Validator::check_field`].

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Email format as recommended by the WHATWG for `<input type="email">`.
    pub static ref EMAIL_RX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    )
    .expect("email pattern is a valid regex");
}

/// Accumulated validation errors for a single form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validator {
    /// Errors that belong to no particular field (e.g. bad credentials).
    pub non_field_errors: Vec<String>,
    /// First error recorded per field.
    pub field_errors: BTreeMap<String, String>,
}

impl Validator {
    /// `true` when neither field nor form-wide errors were recorded.
    pub fn valid(&self) -> bool {
        self.field_errors.is_empty() && self.non_field_errors.is_empty()
    }

    pub fn add_field_error(&mut self, key: &str, message: &str) {
        self.field_errors
            .entry(key.to_string())
            .or_insert_with(|| message.to_string());
    }

    pub fn add_non_field_error(&mut self, message: &str) {
        self.non_field_errors.push(message.to_string());
    }

    /// Records `message` against `key` unless `ok` holds.
    pub fn check_field(&mut self, ok: bool, key: &str, message: &str) {
        if !ok {
            self.add_field_error(key, message);
        }
    }

    pub fn field_error(&self, key: &str) -> Option<&str> {
        self.field_errors.get(key).map(String::as_str)
    }
}

pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Counts characters, not bytes: `"Zoë"` has three.
pub fn max_chars(value: &str, n: usize) -> bool {
    value.chars().count() <= n
}

pub fn min_chars(value: &str, n: usize) -> bool {
    value.chars().count() >= n
}

pub fn permitted_value<T: PartialEq>(value: T, permitted: &[T]) -> bool {
    permitted.contains(&value)
}

pub fn matches(value: &str, rx: &Regex) -> bool {
    rx.is_match(value)
}
