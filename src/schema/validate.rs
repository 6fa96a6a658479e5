//! Input validation.
//!
//! Every request body type implements [`Schema`]: `parse` either yields the
//! value the storage layer should receive or a [`ValidationErrors`] tree keyed
//! by field name. Nothing invalid reaches storage.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

lazy_static::lazy_static! {
    /// Deliberately loose: something@something.tld
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Field-level validation messages, keyed by camelCase field name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// `Ok(value)` when no errors were recorded.
    pub fn finish<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }

    // Checks. Each one records at most one message for the field.

    pub fn required(&mut self, field: &str, value: &str) -> bool {
        if value.trim().is_empty() {
            self.add(field, format!("{} is required", field));
            false
        } else {
            true
        }
    }

    pub fn min_len(&mut self, field: &str, value: &str, min: usize) {
        if !self.required(field, value) {
            return;
        }
        if value.trim().chars().count() < min {
            self.add(
                field,
                format!("{} must be at least {} characters", field, min),
            );
        }
    }

    pub fn max_len(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.add(
                field,
                format!("{} must be at most {} characters", field, max),
            );
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        if !self.required(field, value) {
            return;
        }
        if !is_valid_email(value.trim()) {
            self.add(field, "Invalid email address");
        }
    }

    pub fn range(&mut self, field: &str, value: i32, min: i32, max: i32) {
        if value < min || value > max {
            self.add(
                field,
                format!("{} must be between {} and {}", field, min, max),
            );
        }
    }

    /// Apply `check` only when a patch actually carries the field.
    pub fn present<T: ?Sized>(&mut self, value: Option<&T>, check: impl FnOnce(&mut Self, &T)) {
        if let Some(v) = value {
            check(self, v);
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<&str> = self.fields().collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// A request body that can be checked and turned into storage input.
pub trait Schema: serde::de::DeserializeOwned {
    type Output;

    fn parse(self) -> Result<Self::Output, ValidationErrors>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("jo@example.com"));
        assert!(!is_valid_email("jo@example"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("two words@example.com"));
    }

    #[test]
    fn test_min_len_reports_required_once() {
        let mut errors = ValidationErrors::new();
        errors.min_len("message", "", 10);
        assert!(errors.contains("message"));
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["message"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_finish() {
        let errors = ValidationErrors::new();
        assert_eq!(errors.finish(5).unwrap(), 5);

        let mut errors = ValidationErrors::new();
        errors.range("rating", 9, 1, 5);
        assert!(errors.finish(()).is_err());
    }
}
