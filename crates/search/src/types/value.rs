//! Typed condition values.
//!
//! A [`Value`] is the logical (normalized) form of something the user typed.
//! Value holders ([`SingleValue`], [`Range`], [`Compare`], [`PatternMatch`])
//! wrap values together with the extra information each kind needs.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A logical condition value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Free text.
    Text(String),
    /// A whole number.
    Integer(i64),
    /// An exact decimal number.
    Decimal(Decimal),
    /// A calendar date.
    Date(NaiveDate),
    /// A point in time.
    DateTime(DateTime<Utc>),
    /// A boolean flag.
    Boolean(bool),
}

impl Value {
    /// Returns the name of the value's shape, used in messages and fingerprints.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Integer(_) => "integer",
            Value::Decimal(_) => "decimal",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Boolean(_) => "boolean",
        }
    }

    /// Compares two values of a compatible shape.
    ///
    /// Integers and decimals compare numerically with each other; any other
    /// mix of shapes is incomparable and returns `None`.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Decimal(a), Value::Decimal(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Value::Decimal(b)) => Some(Decimal::from(*a).cmp(b)),
            (Value::Decimal(a), Value::Integer(b)) => Some(a.cmp(&Decimal::from(*b))),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Returns the text of a `Text` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the number of an `Integer` value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{}", s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Decimal(d) => write!(f, "{}", d.normalize()),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

/// A single value together with its original textual view.
///
/// Equality and hashing only look at the logical value; the view is kept for
/// exporting the condition back to the user.
#[derive(Debug, Clone)]
pub struct SingleValue {
    /// The logical value.
    pub value: Value,
    /// The textual form the value was created from.
    pub view: String,
}

impl SingleValue {
    /// Creates a new single value with an explicit view.
    pub fn new(value: Value, view: impl Into<String>) -> Self {
        Self {
            value,
            view: view.into(),
        }
    }

    /// Creates a value whose view is the value's canonical text.
    pub fn from_value(value: impl Into<Value>) -> Self {
        let value = value.into();
        let view = value.to_string();
        Self { value, view }
    }
}

impl PartialEq for SingleValue {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for SingleValue {}

impl Hash for SingleValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

/// A range between two values, each bound independently inclusive or exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Range {
    /// Lower bound.
    pub lower: SingleValue,
    /// Upper bound.
    pub upper: SingleValue,
    /// Whether the lower bound itself matches.
    pub inclusive_lower: bool,
    /// Whether the upper bound itself matches.
    pub inclusive_upper: bool,
}

impl Range {
    /// Creates a new range.
    pub fn new(
        lower: SingleValue,
        upper: SingleValue,
        inclusive_lower: bool,
        inclusive_upper: bool,
    ) -> Self {
        Self {
            lower,
            upper,
            inclusive_lower,
            inclusive_upper,
        }
    }

    /// Creates a range with both bounds inclusive.
    pub fn inclusive(lower: SingleValue, upper: SingleValue) -> Self {
        Self::new(lower, upper, true, true)
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOperator {
    /// `<`
    #[serde(rename = "<")]
    Lower,
    /// `<=`
    #[serde(rename = "<=")]
    LowerOrEqual,
    /// `>`
    #[serde(rename = ">")]
    Greater,
    /// `>=`
    #[serde(rename = ">=")]
    GreaterOrEqual,
    /// `<>`
    #[serde(rename = "<>")]
    NotEqual,
}

impl CompareOperator {
    /// Returns the operator symbol.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOperator::Lower => "<",
            CompareOperator::LowerOrEqual => "<=",
            CompareOperator::Greater => ">",
            CompareOperator::GreaterOrEqual => ">=",
            CompareOperator::NotEqual => "<>",
        }
    }

    /// Returns true for `>` and `>=`.
    pub fn is_lower_bound(&self) -> bool {
        matches!(
            self,
            CompareOperator::Greater | CompareOperator::GreaterOrEqual
        )
    }

    /// Returns true for `<` and `<=`.
    pub fn is_upper_bound(&self) -> bool {
        matches!(self, CompareOperator::Lower | CompareOperator::LowerOrEqual)
    }

    /// Returns true when the bound value itself matches (`<=`, `>=`).
    pub fn is_inclusive(&self) -> bool {
        matches!(
            self,
            CompareOperator::LowerOrEqual | CompareOperator::GreaterOrEqual
        )
    }
}

impl fmt::Display for CompareOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompareOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<" => Ok(CompareOperator::Lower),
            "<=" => Ok(CompareOperator::LowerOrEqual),
            ">" => Ok(CompareOperator::Greater),
            ">=" => Ok(CompareOperator::GreaterOrEqual),
            "<>" => Ok(CompareOperator::NotEqual),
            _ => Err(format!("unknown comparison operator: {}", s)),
        }
    }
}

/// A comparison against a single value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Compare {
    /// The value compared against.
    pub value: SingleValue,
    /// The comparison operator.
    pub operator: CompareOperator,
}

impl Compare {
    /// Creates a new comparison.
    pub fn new(value: SingleValue, operator: CompareOperator) -> Self {
        Self { value, operator }
    }
}

/// Pattern matching kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternMatchType {
    /// Value occurs anywhere.
    Contains,
    /// Value is a prefix.
    StartsWith,
    /// Value is a suffix.
    EndsWith,
    /// Value is a regular expression.
    Regex,
    /// Whole-value equality.
    Equals,
    /// Negated [`PatternMatchType::Contains`].
    NotContains,
    /// Negated [`PatternMatchType::StartsWith`].
    NotStartsWith,
    /// Negated [`PatternMatchType::EndsWith`].
    NotEndsWith,
    /// Negated [`PatternMatchType::Regex`].
    NotRegex,
    /// Negated [`PatternMatchType::Equals`].
    NotEquals,
}

impl PatternMatchType {
    /// Returns true for the negated kinds.
    pub fn is_negated(&self) -> bool {
        matches!(
            self,
            PatternMatchType::NotContains
                | PatternMatchType::NotStartsWith
                | PatternMatchType::NotEndsWith
                | PatternMatchType::NotRegex
                | PatternMatchType::NotEquals
        )
    }

    /// Returns the positive form of this kind.
    pub fn positive(&self) -> PatternMatchType {
        match self {
            PatternMatchType::NotContains => PatternMatchType::Contains,
            PatternMatchType::NotStartsWith => PatternMatchType::StartsWith,
            PatternMatchType::NotEndsWith => PatternMatchType::EndsWith,
            PatternMatchType::NotRegex => PatternMatchType::Regex,
            PatternMatchType::NotEquals => PatternMatchType::Equals,
            other => *other,
        }
    }

    /// Returns the negated form of a positive kind.
    pub fn negated(&self) -> PatternMatchType {
        match self.positive() {
            PatternMatchType::Contains => PatternMatchType::NotContains,
            PatternMatchType::StartsWith => PatternMatchType::NotStartsWith,
            PatternMatchType::EndsWith => PatternMatchType::NotEndsWith,
            PatternMatchType::Regex => PatternMatchType::NotRegex,
            _ => PatternMatchType::NotEquals,
        }
    }

    /// Symbol used by the textual query syntax (without the negation mark).
    pub fn symbol(&self) -> char {
        match self.positive() {
            PatternMatchType::Contains => '*',
            PatternMatchType::StartsWith => '>',
            PatternMatchType::EndsWith => '<',
            PatternMatchType::Regex => '?',
            _ => '=',
        }
    }

    /// Resolves a syntax symbol to a positive match kind.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '*' => Some(PatternMatchType::Contains),
            '>' => Some(PatternMatchType::StartsWith),
            '<' => Some(PatternMatchType::EndsWith),
            '?' => Some(PatternMatchType::Regex),
            '=' => Some(PatternMatchType::Equals),
            _ => None,
        }
    }
}

/// A pattern match against a text value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternMatch {
    /// The pattern text (a regular expression for the regex kinds).
    pub value: String,
    /// How the pattern is matched.
    pub match_type: PatternMatchType,
    /// Whether matching ignores case.
    pub case_insensitive: bool,
}

impl PatternMatch {
    /// Creates a new pattern match.
    pub fn new(value: impl Into<String>, match_type: PatternMatchType, case_insensitive: bool) -> Self {
        Self {
            value: value.into(),
            match_type,
            case_insensitive,
        }
    }
}

/// The kinds of values a field can accept.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ValueKind {
    /// Included single values.
    Single,
    /// Excluded single values.
    Excluded,
    /// Included ranges.
    Range,
    /// Excluded ranges.
    ExcludedRange,
    /// Comparisons.
    Comparison,
    /// Pattern matches.
    PatternMatch,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Single => write!(f, "single"),
            ValueKind::Excluded => write!(f, "excluded"),
            ValueKind::Range => write!(f, "range"),
            ValueKind::ExcludedRange => write!(f, "excluded-range"),
            ValueKind::Comparison => write!(f, "comparison"),
            ValueKind::PatternMatch => write!(f, "pattern-match"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_value_equality_ignores_view() {
        let a = SingleValue::new(Value::Integer(5), "05");
        let b = SingleValue::new(Value::Integer(5), "5");
        assert_eq!(a, b);
    }

    #[test]
    fn test_compare_numeric_cross_shape() {
        let int = Value::Integer(2);
        let dec = Value::Decimal(Decimal::new(25, 1));
        assert_eq!(int.compare(&dec), Some(Ordering::Less));
        assert_eq!(dec.compare(&int), Some(Ordering::Greater));
    }

    #[test]
    fn test_compare_incompatible_shapes() {
        let date = Value::Date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(date.compare(&Value::Integer(1)), None);
    }

    #[test]
    fn test_value_display() {
        let date = Value::Date(NaiveDate::from_ymd_opt(2020, 2, 9).unwrap());
        assert_eq!(date.to_string(), "2020-02-09");
        assert_eq!(Value::Decimal(Decimal::new(1500, 3)).to_string(), "1.5");
    }

    #[test]
    fn test_pattern_type_negation() {
        assert!(PatternMatchType::NotContains.is_negated());
        assert_eq!(
            PatternMatchType::Contains.negated(),
            PatternMatchType::NotContains
        );
        assert_eq!(
            PatternMatchType::NotRegex.positive(),
            PatternMatchType::Regex
        );
        assert_eq!(PatternMatchType::NotStartsWith.symbol(), '>');
    }

    #[test]
    fn test_compare_operator_parse() {
        assert_eq!("<>".parse::<CompareOperator>(), Ok(CompareOperator::NotEqual));
        assert!("=>".parse::<CompareOperator>().is_err());
    }
}
