//! SQL fragments and bound parameters.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::field::FieldType;
use crate::types::Value;

/// A fragment of SQL with named, bound parameters.
///
/// The SQL never contains literal values; every value is bound through a
/// `:name` placeholder listed in `params`, in order of appearance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SqlFragment {
    /// The boolean expression.
    pub sql: String,
    /// Bound parameters.
    pub params: Vec<BoundParam>,
}

impl SqlFragment {
    /// Creates a new fragment with no parameters.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Creates a fragment with parameters.
    pub fn with_params(sql: impl Into<String>, params: Vec<BoundParam>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Returns true if this fragment is empty (matches everything).
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

impl fmt::Display for SqlFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// A named parameter with its value and declared column type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundParam {
    /// Placeholder name without the leading `:`.
    pub name: String,
    /// Bound value.
    pub value: SqlParam,
    /// Declared type of the compared column.
    pub db_type: DbType,
}

/// A SQL parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SqlParam {
    /// String parameter.
    String(String),
    /// Integer parameter.
    Integer(i64),
    /// Exact decimal parameter.
    Decimal(#[serde(with = "decimal_string")] Decimal),
    /// Date parameter.
    Date(NaiveDate),
    /// Timestamp parameter.
    DateTime(DateTime<Utc>),
    /// Boolean parameter.
    Boolean(bool),
}

impl SqlParam {
    /// Creates a string parameter.
    pub fn string(s: impl Into<String>) -> Self {
        SqlParam::String(s.into())
    }
}

impl From<&Value> for SqlParam {
    fn from(value: &Value) -> Self {
        match value {
            Value::Text(s) => SqlParam::String(s.clone()),
            Value::Integer(i) => SqlParam::Integer(*i),
            Value::Decimal(d) => SqlParam::Decimal(*d),
            Value::Date(d) => SqlParam::Date(*d),
            Value::DateTime(dt) => SqlParam::DateTime(*dt),
            Value::Boolean(b) => SqlParam::Boolean(*b),
        }
    }
}

/// Declared type of a mapped column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// Character data.
    Text,
    /// 64-bit integer.
    Integer,
    /// Exact decimal.
    Decimal,
    /// Calendar date.
    Date,
    /// Timestamp.
    DateTime,
    /// Boolean.
    Boolean,
}

impl DbType {
    /// Lowercase name, as used in declarations.
    pub fn as_str(&self) -> &'static str {
        match self {
            DbType::Text => "text",
            DbType::Integer => "integer",
            DbType::Decimal => "decimal",
            DbType::Date => "date",
            DbType::DateTime => "datetime",
            DbType::Boolean => "boolean",
        }
    }
}

impl From<FieldType> for DbType {
    fn from(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Text => DbType::Text,
            FieldType::Integer => DbType::Integer,
            FieldType::Decimal => DbType::Decimal,
            FieldType::Date | FieldType::Birthday => DbType::Date,
            FieldType::DateTime => DbType::DateTime,
            FieldType::Boolean => DbType::Boolean,
        }
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serializes decimals as strings so no precision is lost.
mod decimal_string {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        let s = String::deserialize(deserializer)?;
        Decimal::from_str(&s).map_err(de::Error::custom)
    }
}
