//! Conversion hooks for the SQL generator.

use std::fmt::Debug;

use crate::conversion::ConversionStrategy;
use crate::error::GenerationResult;
use crate::types::Value;

use super::dialect::SqlDialect;
use super::fragment::{DbType, SqlParam};
use super::parameters::ParameterBag;

/// Per-value scratch state handed to a [`SqlConversion`].
///
/// Created by the generator for each value of a converted field; it lives
/// only while that value is rendered.
#[derive(Debug)]
pub struct ConversionHints<'a> {
    /// Field name.
    pub field: &'a str,
    /// Mapped column, as configured.
    pub column: &'a str,
    /// Declared column type.
    pub db_type: DbType,
    /// Target dialect.
    pub dialect: SqlDialect,
    /// The value being rendered.
    pub value: &'a Value,
    /// Strategy selected for `value`.
    pub strategy: ConversionStrategy,
    params: &'a mut ParameterBag,
}

impl<'a> ConversionHints<'a> {
    pub(crate) fn new(
        field: &'a str,
        column: &'a str,
        db_type: DbType,
        dialect: SqlDialect,
        value: &'a Value,
        params: &'a mut ParameterBag,
    ) -> Self {
        Self {
            field,
            column,
            db_type,
            dialect,
            value,
            strategy: ConversionStrategy::Direct,
            params,
        }
    }

    /// Binds a value, returning its placeholder.
    pub fn bind(&mut self, value: SqlParam, db_type: DbType) -> String {
        self.params.bind(value, db_type)
    }

    /// Binds the current value with the column's type.
    pub fn bind_current(&mut self) -> String {
        let value = SqlParam::from(self.value);
        self.params.bind(value, self.db_type)
    }
}

/// Changes how a field's column and values are rendered in SQL.
///
/// [`strategy`](SqlConversion::strategy) is asked once per value; the
/// selected strategy is stored in the hints so column and value conversion
/// agree on the rendering.
pub trait SqlConversion: Send + Sync + Debug {
    /// Name used in logs and backend identifiers.
    fn name(&self) -> &'static str;

    /// Selects the rendering for `hints.value`.
    fn strategy(&self, _hints: &ConversionHints<'_>) -> ConversionStrategy {
        ConversionStrategy::Direct
    }

    /// Returns the column expression. The default keeps the column.
    fn convert_column(&self, hints: &mut ConversionHints<'_>) -> GenerationResult<String> {
        Ok(hints.column.to_string())
    }

    /// Returns the value expression. The default binds the value unchanged.
    fn convert_value(&self, hints: &mut ConversionHints<'_>) -> GenerationResult<String> {
        Ok(hints.bind_current())
    }
}
