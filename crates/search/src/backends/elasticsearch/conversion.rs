//! Conversion hooks for the document-search generator.

use std::fmt::Debug;

use serde_json::{Value as JsonValue, json};

use crate::conversion::ConversionStrategy;
use crate::error::GenerationResult;
use crate::types::{Compare, Range, Value};

/// Context handed to a [`DocumentConversion`] for one value.
#[derive(Debug, Clone, Copy)]
pub struct DocumentHints<'a> {
    /// Field name.
    pub field: &'a str,
    /// Mapped document property.
    pub property: &'a str,
    /// Strategy selected for the value.
    pub strategy: ConversionStrategy,
}

/// The value holder a query clause is requested for.
#[derive(Debug, Clone, Copy)]
pub enum QueryTarget<'a> {
    /// A single value.
    Single(&'a Value),
    /// A range.
    Range(&'a Range),
    /// A comparison.
    Compare(&'a Compare),
}

/// Changes how a field's values are rendered in a query document.
pub trait DocumentConversion: Send + Sync + Debug {
    /// Short name used in backend ids.
    fn name(&self) -> &'static str;

    /// Selects the rendering for a value.
    fn strategy(&self, _value: &Value) -> ConversionStrategy {
        ConversionStrategy::Direct
    }

    /// Renders a value as it is stored in the document.
    fn convert_value(&self, value: &Value, _hints: &DocumentHints<'_>) -> GenerationResult<JsonValue> {
        Ok(json_value(value))
    }

    /// Replaces the whole clause for a target.
    ///
    /// Returning `None` keeps the default clause, built from
    /// [`convert_value`](Self::convert_value).
    fn convert_query(
        &self,
        _target: QueryTarget<'_>,
        _hints: &DocumentHints<'_>,
    ) -> GenerationResult<Option<JsonValue>> {
        Ok(None)
    }
}

/// Default JSON rendering of a value.
///
/// Decimals are rendered as strings to keep their precision; dates use
/// `YYYY-MM-DD` and timestamps RFC 3339.
pub fn json_value(value: &Value) -> JsonValue {
    match value {
        Value::Text(s) => json!(s),
        Value::Integer(i) => json!(i),
        Value::Decimal(d) => json!(d.to_string()),
        Value::Date(d) => json!(d.format("%Y-%m-%d").to_string()),
        Value::DateTime(dt) => json!(dt.to_rfc3339()),
        Value::Boolean(b) => json!(b),
    }
}
