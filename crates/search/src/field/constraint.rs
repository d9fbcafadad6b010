//! Per-field value constraints checked by the validator.

use std::cmp::Ordering;

use regex::Regex;

use crate::types::Value;

/// A restriction on the values of a field.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// Values must not be lower than the bound.
    Min(Value),
    /// Values must not be higher than the bound.
    Max(Value),
    /// Text values must not be longer than this many characters.
    MaxLength(usize),
    /// Text values must match the expression.
    Matches(Regex),
}

impl Constraint {
    /// Checks a value, returning the message template and its parameters on failure.
    pub fn check(&self, value: &Value) -> Option<(&'static str, Vec<(&'static str, String)>)> {
        match self {
            Constraint::Min(min) => match value.compare(min) {
                Some(Ordering::Less) => Some((
                    "This value should be {{ limit }} or more.",
                    vec![("limit", min.to_string())],
                )),
                _ => None,
            },
            Constraint::Max(max) => match value.compare(max) {
                Some(Ordering::Greater) => Some((
                    "This value should be {{ limit }} or less.",
                    vec![("limit", max.to_string())],
                )),
                _ => None,
            },
            Constraint::MaxLength(max) => match value {
                Value::Text(s) if s.chars().count() > *max => Some((
                    "This value is too long. It should have {{ limit }} characters or less.",
                    vec![("limit", max.to_string())],
                )),
                _ => None,
            },
            Constraint::Matches(re) => match value {
                Value::Text(s) if !re.is_match(s) => Some((
                    "This value is not valid.",
                    vec![("pattern", re.as_str().to_string())],
                )),
                _ => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_max() {
        assert!(Constraint::Min(Value::Integer(1)).check(&Value::Integer(0)).is_some());
        assert!(Constraint::Min(Value::Integer(1)).check(&Value::Integer(1)).is_none());
        assert!(Constraint::Max(Value::Integer(10)).check(&Value::Integer(11)).is_some());
    }

    #[test]
    fn test_max_length_counts_chars() {
        let c = Constraint::MaxLength(3);
        assert!(c.check(&Value::from("äöü")).is_none());
        assert!(c.check(&Value::from("abcd")).is_some());
    }

    #[test]
    fn test_matches() {
        let c = Constraint::Matches(Regex::new("^[A-Z]{2}$").unwrap());
        assert!(c.check(&Value::from("NL")).is_none());
        assert!(c.check(&Value::from("nl")).is_some());
    }
}
