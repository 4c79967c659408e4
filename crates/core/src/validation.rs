//! Field-level validation driven by explicit rule tables.
//!
//! Each validated type lists its rules as `(field path, accessor, constraints)`.
//! Constraints for one field are checked in order and evaluation of that field
//! stops at the first failure, so a single defect never reports twice.

use serde::Serialize;

use crate::error::DomainError;

/// Message language. Only the text of a violation depends on it.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    English,
    German,
}

/// A single constraint on a string-valued field.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Value must contain at least one non-whitespace character.
    NotEmpty,
    /// Value must be a plain decimal number with at most `integer` digits before
    /// the decimal point and at most `fraction` after it.
    Digits { integer: usize, fraction: usize },
}

impl Constraint {
    pub fn is_satisfied_by(&self, value: &str) -> bool {
        match *self {
            Constraint::NotEmpty => !value.trim().is_empty(),
            Constraint::Digits { integer, fraction } => digits_within(value, integer, fraction),
        }
    }

    pub fn message(&self, locale: Locale) -> String {
        match (*self, locale) {
            (Constraint::NotEmpty, Locale::English) => "may not be empty".to_string(),
            (Constraint::NotEmpty, Locale::German) => "darf nicht leer sein".to_string(),
            (Constraint::Digits { integer, fraction }, Locale::English) => format!(
                "numeric value out of bounds (<{integer} digits>.<{fraction} digits> expected)"
            ),
            (Constraint::Digits { integer, fraction }, Locale::German) => format!(
                "numerischer Wert außerhalb des gültigen Bereichs (<{integer} Ziffern>.<{fraction} Ziffern> erwartet)"
            ),
        }
    }
}

fn digits_within(value: &str, integer: usize, fraction: usize) -> bool {
    let (int_part, frac_part) = match value.split_once('.') {
        Some((i, f)) => (i, f),
        None => (value, ""),
    };

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());

    !int_part.is_empty()
        && all_digits(int_part)
        && all_digits(frac_part)
        && int_part.len() <= integer
        && frac_part.len() <= fraction
}

/// One row of a rule table.
pub struct FieldRule<T> {
    /// Property path reported in violations (e.g. `firstName`).
    pub path: &'static str,
    pub value: fn(&T) -> &str,
    pub constraints: &'static [Constraint],
}

/// A failed constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub path: String,
    pub message: String,
    pub invalid_value: String,
}

impl core::fmt::Display for Violation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// All violations found for one object, in rule-table order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    /// The violation reported for `path`, if any.
    pub fn for_path(&self, path: &str) -> Option<&Violation> {
        self.0.iter().find(|v| v.path == path)
    }

    /// `Ok(())` when clean, otherwise a `DomainError::Validation`.
    pub fn into_result(self) -> Result<(), DomainError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self))
        }
    }
}

impl IntoIterator for Violations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl core::fmt::Display for Violations {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Types that carry a validation rule table.
pub trait Validate: Sized + 'static {
    fn rules() -> &'static [FieldRule<Self>];
}

/// Evaluates rule tables.
#[derive(Debug, Copy, Clone, Default)]
pub struct Validator {
    locale: Locale,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locale(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn validate<T: Validate>(&self, target: &T) -> Violations {
        self.apply(T::rules(), target)
    }

    /// Evaluate an arbitrary rule table against `target`.
    pub fn apply<T>(&self, rules: &[FieldRule<T>], target: &T) -> Violations {
        let mut violations = Vec::new();
        for rule in rules {
            let value = (rule.value)(target);
            if let Some(failed) = rule.constraints.iter().find(|c| !c.is_satisfied_by(value)) {
                violations.push(Violation {
                    path: rule.path.to_string(),
                    message: failed.message(self.locale),
                    invalid_value: value.to_string(),
                });
            }
        }
        Violations(violations)
    }
}
