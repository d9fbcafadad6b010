//! Searching a birthday column by date or by age.

use serde_json::{Value as JsonValue, json};

use crate::backends::elasticsearch::{DocumentConversion, DocumentHints, QueryTarget};
use crate::backends::sql::{ConversionHints, DbType, SqlConversion, SqlDialect, SqlParam};
use crate::error::{GenerationError, GenerationResult};
use crate::types::{CompareOperator, Value};

use super::ConversionStrategy;

/// Name of the SQLite function computing an age from a date.
pub const SQLITE_AGE_FUNCTION: &str = "search_conversion_age";

/// Compares a date column either by date or by age in whole years.
///
/// An integer value is an age and selects [`ConversionStrategy::AsAge`]; the
/// column is then rendered as the dialect's age expression. A date value
/// selects [`ConversionStrategy::AsDate`] and compares the column as a date.
#[derive(Debug, Clone, Copy, Default)]
pub struct AgeDateConversion;

impl AgeDateConversion {
    /// Creates the conversion.
    pub fn new() -> Self {
        Self
    }

    fn select(value: &Value) -> ConversionStrategy {
        match value {
            Value::Integer(_) => ConversionStrategy::AsAge,
            Value::Date(_) | Value::DateTime(_) => ConversionStrategy::AsDate,
            _ => ConversionStrategy::Direct,
        }
    }
}

impl SqlConversion for AgeDateConversion {
    fn name(&self) -> &'static str {
        "age-date"
    }

    fn strategy(&self, hints: &ConversionHints<'_>) -> ConversionStrategy {
        Self::select(hints.value)
    }

    fn convert_column(&self, hints: &mut ConversionHints<'_>) -> GenerationResult<String> {
        let column = hints.column;
        match hints.strategy {
            ConversionStrategy::AsAge => match hints.dialect {
                SqlDialect::MySql => Ok(format!("TIMESTAMPDIFF(YEAR, {}, CURDATE())", column)),
                SqlDialect::Postgres => Ok(format!(
                    "CAST(EXTRACT(YEAR FROM AGE(CAST({} AS DATE))) AS INTEGER)",
                    column
                )),
                SqlDialect::Sqlite => Ok(format!("{}({})", SQLITE_AGE_FUNCTION, column)),
                SqlDialect::SqlServer => Err(GenerationError::UnsupportedPlatform {
                    dialect: hints.dialect.name().to_string(),
                    feature: "age conversion".to_string(),
                }),
            },
            ConversionStrategy::AsDate => Ok(match hints.dialect {
                SqlDialect::MySql => format!("DATE({})", column),
                SqlDialect::Sqlite => format!("date({})", column),
                SqlDialect::Postgres | SqlDialect::SqlServer => {
                    format!("CAST({} AS DATE)", column)
                }
            }),
            _ => Ok(column.to_string()),
        }
    }

    fn convert_value(&self, hints: &mut ConversionHints<'_>) -> GenerationResult<String> {
        let value = SqlParam::from(hints.value);
        Ok(match hints.strategy {
            ConversionStrategy::AsAge => hints.bind(value, DbType::Integer),
            ConversionStrategy::AsDate => hints.bind(value, DbType::Date),
            _ => hints.bind_current(),
        })
    }
}

impl DocumentConversion for AgeDateConversion {
    fn name(&self) -> &'static str {
        "age-date"
    }

    fn strategy(&self, value: &Value) -> ConversionStrategy {
        Self::select(value)
    }

    fn convert_query(
        &self,
        target: QueryTarget<'_>,
        hints: &DocumentHints<'_>,
    ) -> GenerationResult<Option<JsonValue>> {
        if hints.strategy != ConversionStrategy::AsAge {
            return Ok(None);
        }
        let age = |value: &Value| {
            value.as_integer().ok_or_else(|| GenerationError::Conversion {
                field: hints.field.to_string(),
                message: format!("expected an age, got {}", value.type_name()),
            })
        };
        let shift = |n: i64, by: i64| {
            n.checked_add(by).ok_or_else(|| GenerationError::Conversion {
                field: hints.field.to_string(),
                message: format!("age {} is out of range", n),
            })
        };

        // Born within (now - (N + 1) years, now - N years] means aged N.
        let (youngest, oldest) = match target {
            QueryTarget::Single(value) => {
                let n = age(value)?;
                (Some(n), Some(n))
            }
            QueryTarget::Range(range) => {
                let lower = age(&range.lower.value)?;
                let upper = age(&range.upper.value)?;
                (
                    Some(if range.inclusive_lower { lower } else { shift(lower, 1)? }),
                    Some(if range.inclusive_upper { upper } else { shift(upper, -1)? }),
                )
            }
            QueryTarget::Compare(compare) => {
                let n = age(&compare.value.value)?;
                match compare.operator {
                    CompareOperator::Greater => (Some(shift(n, 1)?), None),
                    CompareOperator::GreaterOrEqual => (Some(n), None),
                    CompareOperator::Lower => (None, Some(shift(n, -1)?)),
                    CompareOperator::LowerOrEqual => (None, Some(n)),
                    CompareOperator::NotEqual => (Some(n), Some(n)),
                }
            }
        };

        let mut bounds = serde_json::Map::new();
        if let Some(oldest) = oldest {
            bounds.insert("gt".to_string(), json!(format!("now-{}y/d", shift(oldest, 1)?)));
        }
        if let Some(youngest) = youngest {
            bounds.insert("lte".to_string(), json!(format!("now-{}y/d", youngest)));
        }
        Ok(Some(json!({ "range": { hints.property: bounds } })))
    }
}
