//! Field value types and view transformation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Value;

/// The logical type of a field.
///
/// The type decides how the textual view of a value is turned into a
/// [`Value`] and which value shapes the validator accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text (the default).
    #[default]
    Text,
    /// Whole numbers.
    Integer,
    /// Exact decimals; integers are accepted too.
    Decimal,
    /// Calendar dates (`YYYY-MM-DD`).
    Date,
    /// Points in time (RFC 3339, or `YYYY-MM-DD HH:MM:SS` as UTC).
    DateTime,
    /// `true`/`false` (also `yes`/`no`, `1`/`0`).
    Boolean,
    /// A birth date searched either by date or by age in years.
    Birthday,
}

impl FieldType {
    /// Transforms a textual view into a value.
    ///
    /// The error is a human-readable reason, used as a validation message.
    pub fn transform(&self, view: &str) -> Result<Value, String> {
        let trimmed = view.trim();
        match self {
            FieldType::Text => Ok(Value::Text(view.to_string())),
            FieldType::Integer => trimmed
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| format!("\"{}\" is not a valid integer.", view)),
            FieldType::Decimal => Decimal::from_str(trimmed)
                .map(Value::Decimal)
                .map_err(|_| format!("\"{}\" is not a valid decimal number.", view)),
            FieldType::Date => parse_date(trimmed)
                .map(Value::Date)
                .ok_or_else(|| format!("\"{}\" is not a valid date (YYYY-MM-DD).", view)),
            FieldType::DateTime => parse_datetime(trimmed)
                .map(Value::DateTime)
                .ok_or_else(|| format!("\"{}\" is not a valid date-time.", view)),
            FieldType::Boolean => match trimmed.to_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(Value::Boolean(true)),
                "false" | "no" | "0" => Ok(Value::Boolean(false)),
                _ => Err(format!("\"{}\" is not a valid boolean.", view)),
            },
            FieldType::Birthday => {
                if let Ok(age) = trimmed.parse::<i64>() {
                    if age < 0 {
                        return Err(format!("\"{}\" is not a valid age.", view));
                    }
                    return Ok(Value::Integer(age));
                }
                parse_date(trimmed).map(Value::Date).ok_or_else(|| {
                    format!("\"{}\" is neither a valid date nor an age.", view)
                })
            }
        }
    }

    /// Returns true if a value of this shape can belong to a field of this type.
    pub fn accepts_value(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (FieldType::Text, Value::Text(_))
                | (FieldType::Integer, Value::Integer(_))
                | (FieldType::Decimal, Value::Decimal(_) | Value::Integer(_))
                | (FieldType::Date, Value::Date(_))
                | (FieldType::DateTime, Value::DateTime(_))
                | (FieldType::Boolean, Value::Boolean(_))
                | (FieldType::Birthday, Value::Date(_) | Value::Integer(_))
        )
    }

    /// Returns true if values of this type have a meaningful order.
    pub fn is_orderable(&self) -> bool {
        !matches!(self, FieldType::Boolean)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Text => write!(f, "text"),
            FieldType::Integer => write!(f, "integer"),
            FieldType::Decimal => write!(f, "decimal"),
            FieldType::Date => write!(f, "date"),
            FieldType::DateTime => write!(f, "datetime"),
            FieldType::Boolean => write!(f, "boolean"),
            FieldType::Birthday => write!(f, "birthday"),
        }
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
