//! Explicit SQL casts.

use crate::backends::sql::{ConversionHints, SqlConversion};
use crate::error::GenerationResult;

/// Casts both the column and the bound value to a SQL type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastConversion {
    sql_type: String,
}

impl CastConversion {
    /// Creates a cast to `sql_type`, e.g. `DECIMAL(10, 2)`.
    pub fn new(sql_type: impl Into<String>) -> Self {
        Self {
            sql_type: sql_type.into(),
        }
    }

    /// Target SQL type.
    pub fn sql_type(&self) -> &str {
        &self.sql_type
    }
}

impl SqlConversion for CastConversion {
    fn name(&self) -> &'static str {
        "cast"
    }

    fn convert_column(&self, hints: &mut ConversionHints<'_>) -> GenerationResult<String> {
        Ok(format!("CAST({} AS {})", hints.column, self.sql_type))
    }

    fn convert_value(&self, hints: &mut ConversionHints<'_>) -> GenerationResult<String> {
        let placeholder = hints.bind_current();
        Ok(format!("CAST({} AS {})", placeholder, self.sql_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::sql::{DbType, ParameterBag, SqlDialect};
    use crate::types::Value;

    #[test]
    fn test_cast_column_and_value() {
        let conversion = CastConversion::new("INTEGER");
        let value = Value::from("42");
        let mut params = ParameterBag::new("p");
        let mut hints =
            ConversionHints::new("code", "t.code", DbType::Text, SqlDialect::Postgres, &value, &mut params);

        assert_eq!(conversion.convert_column(&mut hints).unwrap(), "CAST(t.code AS INTEGER)");
        assert_eq!(conversion.convert_value(&mut hints).unwrap(), "CAST(:p0 AS INTEGER)");
        assert_eq!(params.len(), 1);
    }
}
