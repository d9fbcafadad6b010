//! SQL condition generator.

use std::collections::BTreeMap;

use tracing::debug;

use crate::backends::{CompiledFragment, ConditionGenerator};
use crate::error::{GenerationError, GenerationResult};
use crate::field::{FieldConfig, FieldSet};
use crate::types::{
    Compare, CompareOperator, Range, SearchCondition, SingleValue, Value, ValuesBag, ValuesGroup,
};

use super::conversion::ConversionHints;
use super::dialect::SqlDialect;
use super::fragment::{DbType, SqlFragment, SqlParam};
use super::parameters::ParameterBag;
use super::pattern::{PatternMode, render_pattern};

/// Default prefix of bound parameter names.
pub const DEFAULT_PARAM_PREFIX: &str = "search_";

/// Column a field is mapped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFieldMapping {
    /// Column expression, e.g. `u.birthday`.
    pub column: String,
    /// Declared column type, used for parameter binding.
    pub db_type: DbType,
}

/// Compiles a [`SearchCondition`] into a WHERE-clause [`SqlFragment`].
///
/// Every field present in the condition must be mapped with
/// [`set_field`](Self::set_field); a field may be mapped to several columns,
/// in which case the columns are OR-ed. Values are never inlined.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use helios_search::backends::sql::{DbType, SqlConditionGenerator, SqlDialect};
/// use helios_search::field::{FieldConfig, FieldSet, FieldType};
/// use helios_search::input::StringQueryInput;
///
/// let field_set = Arc::new(
///     FieldSet::builder("users")
///         .add(FieldConfig::new("id", FieldType::Integer))
///         .build()
///         .unwrap(),
/// );
/// let condition = StringQueryInput::default()
///     .process("id: 1, 2", &field_set)
///     .unwrap();
///
/// let mut generator = SqlConditionGenerator::new(SqlDialect::Postgres);
/// generator.set_field("id", "u.id", DbType::Integer);
///
/// let fragment = generator.apply(&condition).unwrap();
/// assert_eq!(fragment.sql, "u.id IN (:search_0, :search_1)");
/// assert_eq!(fragment.params.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct SqlConditionGenerator {
    dialect: SqlDialect,
    param_prefix: String,
    pattern_mode: PatternMode,
    mappings: BTreeMap<String, Vec<SqlFieldMapping>>,
}

impl SqlConditionGenerator {
    /// Creates a generator without field mappings.
    pub fn new(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            param_prefix: DEFAULT_PARAM_PREFIX.to_string(),
            pattern_mode: PatternMode::default(),
            mappings: BTreeMap::new(),
        }
    }

    /// Sets the prefix of parameter names (default `search_`).
    pub fn with_param_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.param_prefix = prefix.into();
        self
    }

    /// Sets how LIKE wildcards are rendered.
    pub fn with_pattern_mode(mut self, mode: PatternMode) -> Self {
        self.pattern_mode = mode;
        self
    }

    /// Target dialect.
    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    /// Maps a field to a column. Calling this again for the same field adds
    /// another column.
    pub fn set_field(
        &mut self,
        field: impl Into<String>,
        column: impl Into<String>,
        db_type: DbType,
    ) -> &mut Self {
        self.mappings
            .entry(field.into())
            .or_default()
            .push(SqlFieldMapping {
                column: column.into(),
                db_type,
            });
        self
    }

    /// Columns mapped for a field.
    pub fn mappings(&self, field: &str) -> &[SqlFieldMapping] {
        self.mappings.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Compiles the condition.
    ///
    /// An empty condition yields an empty fragment, which matches everything.
    pub fn apply(&self, condition: &SearchCondition) -> GenerationResult<SqlFragment> {
        if condition.has_errors() {
            return Err(GenerationError::InvalidCondition {
                count: condition.errors().len(),
            });
        }

        let mut params = ParameterBag::new(self.param_prefix.clone());
        let sql = self
            .render_group(condition.values_group(), condition.field_set(), &mut params)?
            .unwrap_or_default();

        debug!(
            dialect = %self.dialect,
            field_set = condition.field_set().name(),
            params = params.len(),
            "Generated SQL condition"
        );

        Ok(SqlFragment::with_params(sql, params.into_params()))
    }

    fn render_group(
        &self,
        group: &ValuesGroup,
        field_set: &FieldSet,
        params: &mut ParameterBag,
    ) -> GenerationResult<Option<String>> {
        let mut parts = Vec::new();

        for (name, bag) in &group.fields {
            if bag.is_empty() {
                continue;
            }
            let config = field_set
                .get(name)
                .ok_or_else(|| GenerationError::UnknownField {
                    field: name.clone(),
                })?;
            let mappings = self
                .mappings
                .get(name)
                .filter(|m| !m.is_empty())
                .ok_or_else(|| GenerationError::MissingFieldMapping {
                    field: name.clone(),
                })?;

            let mut columns = Vec::with_capacity(mappings.len());
            for mapping in mappings {
                if let Some(sql) = self.render_bag(config, mapping, bag, params)? {
                    columns.push(sql);
                }
            }
            if let Some(sql) = join(columns, "OR") {
                parts.push(sql);
            }
        }

        for child in &group.groups {
            if let Some(sql) = self.render_group(child, field_set, params)? {
                parts.push(sql);
            }
        }

        Ok(join(parts, group.logical.as_sql()))
    }

    fn render_bag(
        &self,
        config: &FieldConfig,
        mapping: &SqlFieldMapping,
        bag: &ValuesBag,
        params: &mut ParameterBag,
    ) -> GenerationResult<Option<String>> {
        let mut positive = Vec::new();
        let mut negative = Vec::new();

        if !bag.simple_values.is_empty() {
            positive.push(self.render_set(config, mapping, &bag.simple_values, false, params)?);
        }
        for range in &bag.ranges {
            positive.push(self.render_range(config, mapping, range, false, params)?);
        }

        let mut bounds = Vec::new();
        for compare in &bag.comparisons {
            if compare.operator == CompareOperator::NotEqual {
                negative.push(self.render_compare(config, mapping, compare, params)?);
            } else {
                bounds.push(self.render_compare(config, mapping, compare, params)?);
            }
        }
        if let Some(sql) = join(bounds, "AND") {
            positive.push(sql);
        }

        if !bag.excluded_simple_values.is_empty() {
            negative.push(self.render_set(
                config,
                mapping,
                &bag.excluded_simple_values,
                true,
                params,
            )?);
        }
        for range in &bag.excluded_ranges {
            negative.push(self.render_range(config, mapping, range, true, params)?);
        }

        for pattern in &bag.pattern_matchers {
            let sql = render_pattern(
                self.dialect,
                self.pattern_mode,
                &mapping.column,
                pattern,
                params,
            )?;
            if pattern.match_type.is_negated() {
                negative.push(sql);
            } else {
                positive.push(sql);
            }
        }

        let parts = [join(positive, "OR"), join(negative, "AND")]
            .into_iter()
            .flatten()
            .collect();
        Ok(join(parts, "AND"))
    }

    /// Renders an inclusion (or exclusion) test over single values.
    fn render_set(
        &self,
        config: &FieldConfig,
        mapping: &SqlFieldMapping,
        values: &[SingleValue],
        excluded: bool,
        params: &mut ParameterBag,
    ) -> GenerationResult<String> {
        let (eq, connector) = if excluded { ("<>", "AND") } else { ("=", "OR") };

        if let [single] = values {
            let (column, value) = self.operand(config, mapping, &single.value, params)?;
            return Ok(format!("{} {} {}", column, eq, value));
        }

        // Converted values may render different columns per value.
        if config.sql_conversion().is_some() {
            let mut tests = Vec::with_capacity(values.len());
            for single in values {
                let (column, value) = self.operand(config, mapping, &single.value, params)?;
                tests.push(format!("{} {} {}", column, eq, value));
            }
            return Ok(join(tests, connector).unwrap_or_default());
        }

        let placeholders: Vec<String> = values
            .iter()
            .map(|v| params.bind(SqlParam::from(&v.value), mapping.db_type))
            .collect();
        let op = if excluded { "NOT IN" } else { "IN" };
        Ok(format!(
            "{} {} ({})",
            mapping.column,
            op,
            placeholders.join(", ")
        ))
    }

    fn render_range(
        &self,
        config: &FieldConfig,
        mapping: &SqlFieldMapping,
        range: &Range,
        excluded: bool,
        params: &mut ParameterBag,
    ) -> GenerationResult<String> {
        let (lower_col, lower) = self.operand(config, mapping, &range.lower.value, params)?;
        let (upper_col, upper) = self.operand(config, mapping, &range.upper.value, params)?;

        if range.inclusive_lower && range.inclusive_upper && lower_col == upper_col {
            let op = if excluded { "NOT BETWEEN" } else { "BETWEEN" };
            return Ok(format!("{} {} {} AND {}", lower_col, op, lower, upper));
        }

        Ok(match (excluded, range.inclusive_lower, range.inclusive_upper) {
            (false, il, iu) => format!(
                "({} {} {} AND {} {} {})",
                lower_col,
                if il { ">=" } else { ">" },
                lower,
                upper_col,
                if iu { "<=" } else { "<" },
                upper
            ),
            (true, il, iu) => format!(
                "({} {} {} OR {} {} {})",
                lower_col,
                if il { "<" } else { "<=" },
                lower,
                upper_col,
                if iu { ">" } else { ">=" },
                upper
            ),
        })
    }

    fn render_compare(
        &self,
        config: &FieldConfig,
        mapping: &SqlFieldMapping,
        compare: &Compare,
        params: &mut ParameterBag,
    ) -> GenerationResult<String> {
        let (column, value) = self.operand(config, mapping, &compare.value.value, params)?;
        Ok(format!("{} {} {}", column, compare.operator.as_str(), value))
    }

    /// Column and value expressions for one value, applying the field's
    /// conversion when it has one.
    fn operand(
        &self,
        config: &FieldConfig,
        mapping: &SqlFieldMapping,
        value: &Value,
        params: &mut ParameterBag,
    ) -> GenerationResult<(String, String)> {
        let Some(conversion) = config.sql_conversion() else {
            let placeholder = params.bind(SqlParam::from(value), mapping.db_type);
            return Ok((mapping.column.clone(), placeholder));
        };

        let mut hints = ConversionHints::new(
            config.name(),
            &mapping.column,
            mapping.db_type,
            self.dialect,
            value,
            params,
        );
        hints.strategy = conversion.strategy(&hints);
        let column = conversion.convert_column(&mut hints)?;
        let value = conversion.convert_value(&mut hints)?;
        Ok((column, value))
    }
}

impl ConditionGenerator for SqlConditionGenerator {
    fn backend_id(&self) -> String {
        let mappings: Vec<String> = self
            .mappings
            .iter()
            .flat_map(|(field, columns)| {
                columns
                    .iter()
                    .map(move |m| format!("{}={}/{}", field, m.column, m.db_type))
            })
            .collect();
        format!(
            "sql:{}:{}:{}:{}",
            self.dialect,
            self.param_prefix,
            self.pattern_mode.name(),
            mappings.join(",")
        )
    }

    fn compile(&self, condition: &SearchCondition) -> GenerationResult<CompiledFragment> {
        self.apply(condition).map(CompiledFragment::Sql)
    }
}

/// Joins expressions with a connector, parenthesizing compound results.
fn join(mut parts: Vec<String>, connector: &str) -> Option<String> {
    match parts.len() {
        0 => None,
        1 => parts.pop(),
        _ => Some(format!("({})", parts.join(&format!(" {} ", connector)))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::field::{FieldType, FieldSet};
    use crate::types::{
        ConditionErrorMessage, GroupLogical, PatternMatch, PatternMatchType,
    };

    fn field_set() -> Arc<FieldSet> {
        Arc::new(
            FieldSet::builder("users")
                .add(
                    FieldConfig::builder("id", FieldType::Integer)
                        .accept_ranges()
                        .accept_comparisons()
                        .build(),
                )
                .add(
                    FieldConfig::builder("name", FieldType::Text)
                        .accept_pattern_matches()
                        .build(),
                )
                .build()
                .unwrap(),
        )
    }

    fn generator() -> SqlConditionGenerator {
        let mut generator = SqlConditionGenerator::new(SqlDialect::Postgres);
        generator
            .set_field("id", "u.id", DbType::Integer)
            .set_field("name", "u.name", DbType::Text);
        generator
    }

    fn compile(group: ValuesGroup) -> GenerationResult<SqlFragment> {
        generator().apply(&SearchCondition::new(field_set(), group))
    }

    fn int(i: i64) -> SingleValue {
        SingleValue::from_value(i)
    }

    #[test]
    fn test_single_value() {
        let group = ValuesGroup::default()
            .with_field("id", ValuesBag::new().with_simple_value(int(7)));
        let fragment = compile(group).unwrap();
        assert_eq!(fragment.sql, "u.id = :search_0");
        assert_eq!(fragment.params[0].value, SqlParam::Integer(7));
        assert_eq!(fragment.params[0].db_type, DbType::Integer);
    }

    #[test]
    fn test_fields_in_and_group() {
        let group = ValuesGroup::default()
            .with_field("id", ValuesBag::new().with_simple_value(int(1)))
            .with_field(
                "name",
                ValuesBag::new().with_excluded_simple_value(SingleValue::from_value("bob")),
            );
        let fragment = compile(group).unwrap();
        assert_eq!(fragment.sql, "(u.id = :search_0 AND u.name <> :search_1)");
        assert_eq!(fragment.params[1].value, SqlParam::string("bob"));
    }

    #[test]
    fn test_positive_and_negative_parts() {
        let bag = ValuesBag::new()
            .with_simple_value(int(1))
            .with_simple_value(int(2))
            .with_range(Range::inclusive(int(10), int(20)))
            .with_excluded_simple_value(int(15))
            .with_excluded_range(Range::new(int(30), int(40), false, true));
        let fragment = compile(ValuesGroup::default().with_field("id", bag)).unwrap();
        assert_eq!(
            fragment.sql,
            "((u.id IN (:search_0, :search_1) OR u.id BETWEEN :search_2 AND :search_3) \
             AND (u.id <> :search_4 AND (u.id <= :search_5 OR u.id > :search_6)))"
        );
        assert_eq!(fragment.params.len(), 7);
    }

    #[test]
    fn test_comparisons() {
        let bag = ValuesBag::new()
            .with_comparison(Compare::new(int(5), CompareOperator::GreaterOrEqual))
            .with_comparison(Compare::new(int(9), CompareOperator::Lower))
            .with_comparison(Compare::new(int(7), CompareOperator::NotEqual));
        let fragment = compile(ValuesGroup::default().with_field("id", bag)).unwrap();
        assert_eq!(
            fragment.sql,
            "((u.id >= :search_0 AND u.id < :search_1) AND u.id <> :search_2)"
        );
    }

    #[test]
    fn test_or_groups() {
        let group = ValuesGroup::new(GroupLogical::Or)
            .with_group(
                ValuesGroup::default().with_field("id", ValuesBag::new().with_simple_value(int(1))),
            )
            .with_group(ValuesGroup::default().with_field(
                "name",
                ValuesBag::new().with_pattern_match(PatternMatch::new(
                    "jo",
                    PatternMatchType::StartsWith,
                    false,
                )),
            ));
        let fragment = compile(group).unwrap();
        assert_eq!(fragment.sql, "(u.id = :search_0 OR u.name LIKE :search_1)");
        assert_eq!(fragment.params[1].value, SqlParam::string("jo%"));
    }

    #[test]
    fn test_empty_condition() {
        let group = ValuesGroup::default()
            .with_field("id", ValuesBag::new())
            .with_group(ValuesGroup::new(GroupLogical::Or));
        let fragment = compile(group).unwrap();
        assert!(fragment.is_empty());
        assert!(fragment.params.is_empty());
    }

    #[test]
    fn test_refuses_condition_with_errors() {
        let mut bag = ValuesBag::new().with_simple_value(int(1));
        bag.add_error(ConditionErrorMessage::new("[id][0]", "invalid", []));
        let err = compile(ValuesGroup::default().with_field("id", bag)).unwrap_err();
        assert_eq!(err, GenerationError::InvalidCondition { count: 1 });
    }

    #[test]
    fn test_missing_mapping() {
        let generator = SqlConditionGenerator::new(SqlDialect::Sqlite);
        let condition = SearchCondition::new(
            field_set(),
            ValuesGroup::default().with_field("id", ValuesBag::new().with_simple_value(int(1))),
        );
        let err = generator.apply(&condition).unwrap_err();
        assert_eq!(
            err,
            GenerationError::MissingFieldMapping {
                field: "id".to_string()
            }
        );
    }

    #[test]
    fn test_multiple_columns_are_ored() {
        let mut generator = SqlConditionGenerator::new(SqlDialect::Sqlite).with_param_prefix("p");
        generator
            .set_field("name", "u.first_name", DbType::Text)
            .set_field("name", "u.last_name", DbType::Text);
        let condition = SearchCondition::new(
            field_set(),
            ValuesGroup::default().with_field(
                "name",
                ValuesBag::new().with_simple_value(SingleValue::from_value("ann")),
            ),
        );
        let fragment = generator.apply(&condition).unwrap();
        assert_eq!(fragment.sql, "(u.first_name = :p0 OR u.last_name = :p1)");
    }

    #[test]
    fn test_backend_id_tracks_mappings() {
        let a = generator();
        let mut b = generator();
        b.set_field("id", "u.legacy_id", DbType::Integer);
        assert_ne!(a.backend_id(), b.backend_id());
        assert!(a.backend_id().starts_with("sql:postgres:search_:bound:"));
    }
}
