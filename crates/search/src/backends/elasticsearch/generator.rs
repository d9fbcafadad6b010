//! Document-search condition generator.

use std::collections::BTreeMap;

use serde_json::{Map, Value as JsonValue, json};
use tracing::debug;

use crate::backends::{CompiledFragment, ConditionGenerator};
use crate::error::{GenerationError, GenerationResult};
use crate::field::{FieldConfig, FieldSet};
use crate::types::{
    Compare, CompareOperator, GroupLogical, PatternMatch, PatternMatchType, Range,
    SearchCondition, SingleValue, ValuesBag, ValuesGroup,
};

use super::conversion::{DocumentHints, QueryTarget, json_value};

/// Compiles a [`SearchCondition`] into an Elasticsearch bool query.
///
/// AND groups become `bool.must`, OR groups `bool.should` with
/// `minimum_should_match: 1`, and exclusions `bool.must_not`. A condition
/// without values compiles to `match_all`.
#[derive(Debug, Clone, Default)]
pub struct EsConditionGenerator {
    mappings: BTreeMap<String, Vec<String>>,
}

impl EsConditionGenerator {
    /// Creates a generator without field mappings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps a field to a document property. Calling this again for the
    /// same field adds another property.
    pub fn set_field(&mut self, field: impl Into<String>, property: impl Into<String>) -> &mut Self {
        self.mappings
            .entry(field.into())
            .or_default()
            .push(property.into());
        self
    }

    /// Properties mapped for a field.
    pub fn mappings(&self, field: &str) -> &[String] {
        self.mappings.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Compiles the condition into a query document.
    pub fn apply(&self, condition: &SearchCondition) -> GenerationResult<JsonValue> {
        if condition.has_errors() {
            return Err(GenerationError::InvalidCondition {
                count: condition.errors().len(),
            });
        }

        let query = self
            .render_group(condition.values_group(), condition.field_set())?
            .unwrap_or_else(|| json!({ "match_all": {} }));

        debug!(
            field_set = condition.field_set().name(),
            "Generated document query"
        );

        Ok(query)
    }

    fn render_group(
        &self,
        group: &ValuesGroup,
        field_set: &FieldSet,
    ) -> GenerationResult<Option<JsonValue>> {
        let mut clauses = Vec::new();

        for (name, bag) in &group.fields {
            if bag.is_empty() {
                continue;
            }
            let config = field_set
                .get(name)
                .ok_or_else(|| GenerationError::UnknownField {
                    field: name.clone(),
                })?;
            let properties = self
                .mappings
                .get(name)
                .filter(|p| !p.is_empty())
                .ok_or_else(|| GenerationError::MissingFieldMapping {
                    field: name.clone(),
                })?;

            let mut per_property = Vec::with_capacity(properties.len());
            for property in properties {
                if let Some(clause) = self.render_bag(config, property, bag)? {
                    per_property.push(clause);
                }
            }
            if let Some(clause) = should(per_property) {
                clauses.push(clause);
            }
        }

        for child in &group.groups {
            if let Some(clause) = self.render_group(child, field_set)? {
                clauses.push(clause);
            }
        }

        Ok(match group.logical {
            GroupLogical::And => must(clauses),
            GroupLogical::Or => should(clauses),
        })
    }

    fn render_bag(
        &self,
        config: &FieldConfig,
        property: &str,
        bag: &ValuesBag,
    ) -> GenerationResult<Option<JsonValue>> {
        let mut positive = Vec::new();
        let mut negative = Vec::new();

        if !bag.simple_values.is_empty() {
            positive.extend(self.render_terms(config, property, &bag.simple_values)?);
        }
        for range in &bag.ranges {
            positive.push(self.render_range(config, property, range)?);
        }

        let mut bounds = Vec::new();
        for compare in &bag.comparisons {
            if compare.operator == CompareOperator::NotEqual {
                negative.extend(self.render_terms(
                    config,
                    property,
                    std::slice::from_ref(&compare.value),
                )?);
            } else {
                bounds.push(self.render_compare(config, property, compare)?);
            }
        }
        if let Some(clause) = must(bounds) {
            positive.push(clause);
        }

        if !bag.excluded_simple_values.is_empty() {
            negative.extend(self.render_terms(config, property, &bag.excluded_simple_values)?);
        }
        for range in &bag.excluded_ranges {
            negative.push(self.render_range(config, property, range)?);
        }

        for pattern in &bag.pattern_matchers {
            let clause = render_pattern(property, pattern);
            if pattern.match_type.is_negated() {
                negative.push(clause);
            } else {
                positive.push(clause);
            }
        }

        let positive = should(positive);
        if negative.is_empty() {
            return Ok(positive);
        }

        let mut query = Map::new();
        if let Some(clause) = positive {
            query.insert("must".to_string(), json!([clause]));
        }
        query.insert("must_not".to_string(), JsonValue::Array(negative));
        Ok(Some(json!({ "bool": query })))
    }

    /// Term clauses for single values: one `terms` clause when the values
    /// need no conversion, one clause per value otherwise.
    fn render_terms(
        &self,
        config: &FieldConfig,
        property: &str,
        values: &[SingleValue],
    ) -> GenerationResult<Vec<JsonValue>> {
        let Some(conversion) = config.document_conversion() else {
            let clause = match values {
                [single] => json!({ "term": { property: json_value(&single.value) } }),
                _ => {
                    let terms: Vec<JsonValue> = values.iter().map(|v| json_value(&v.value)).collect();
                    json!({ "terms": { property: terms } })
                }
            };
            return Ok(vec![clause]);
        };

        let mut clauses = Vec::with_capacity(values.len());
        for single in values {
            let hints = DocumentHints {
                field: config.name(),
                property,
                strategy: conversion.strategy(&single.value),
            };
            match conversion.convert_query(QueryTarget::Single(&single.value), &hints)? {
                Some(clause) => clauses.push(clause),
                None => {
                    let value = conversion.convert_value(&single.value, &hints)?;
                    clauses.push(json!({ "term": { property: value } }));
                }
            }
        }
        Ok(clauses)
    }

    fn render_range(
        &self,
        config: &FieldConfig,
        property: &str,
        range: &Range,
    ) -> GenerationResult<JsonValue> {
        let lower_key = if range.inclusive_lower { "gte" } else { "gt" };
        let upper_key = if range.inclusive_upper { "lte" } else { "lt" };

        let Some(conversion) = config.document_conversion() else {
            return Ok(json!({ "range": { property: {
                lower_key: json_value(&range.lower.value),
                upper_key: json_value(&range.upper.value),
            } } }));
        };

        let hints = DocumentHints {
            field: config.name(),
            property,
            strategy: conversion.strategy(&range.lower.value),
        };
        if let Some(clause) = conversion.convert_query(QueryTarget::Range(range), &hints)? {
            return Ok(clause);
        }
        Ok(json!({ "range": { property: {
            lower_key: conversion.convert_value(&range.lower.value, &hints)?,
            upper_key: conversion.convert_value(&range.upper.value, &hints)?,
        } } }))
    }

    fn render_compare(
        &self,
        config: &FieldConfig,
        property: &str,
        compare: &Compare,
    ) -> GenerationResult<JsonValue> {
        let key = match compare.operator {
            CompareOperator::Greater => "gt",
            CompareOperator::GreaterOrEqual => "gte",
            CompareOperator::Lower => "lt",
            CompareOperator::LowerOrEqual => "lte",
            CompareOperator::NotEqual => {
                return Err(GenerationError::Conversion {
                    field: config.name().to_string(),
                    message: "'<>' has no range form".to_string(),
                });
            }
        };

        let Some(conversion) = config.document_conversion() else {
            return Ok(json!({ "range": { property: { key: json_value(&compare.value.value) } } }));
        };

        let hints = DocumentHints {
            field: config.name(),
            property,
            strategy: conversion.strategy(&compare.value.value),
        };
        if let Some(clause) = conversion.convert_query(QueryTarget::Compare(compare), &hints)? {
            return Ok(clause);
        }
        let value = conversion.convert_value(&compare.value.value, &hints)?;
        Ok(json!({ "range": { property: { key: value } } }))
    }
}

impl ConditionGenerator for EsConditionGenerator {
    fn backend_id(&self) -> String {
        let mappings: Vec<String> = self
            .mappings
            .iter()
            .map(|(field, properties)| format!("{}={}", field, properties.join("|")))
            .collect();
        format!("document:{}", mappings.join(","))
    }

    fn compile(&self, condition: &SearchCondition) -> GenerationResult<CompiledFragment> {
        self.apply(condition).map(CompiledFragment::Document)
    }
}

fn render_pattern(property: &str, pattern: &PatternMatch) -> JsonValue {
    let (kind, value) = match pattern.match_type.positive() {
        PatternMatchType::Equals => ("term", pattern.value.clone()),
        PatternMatchType::Contains => ("wildcard", format!("*{}*", escape_wildcard(&pattern.value))),
        PatternMatchType::StartsWith => ("prefix", pattern.value.clone()),
        PatternMatchType::EndsWith => ("wildcard", format!("*{}", escape_wildcard(&pattern.value))),
        _ => ("regexp", pattern.value.clone()),
    };

    let mut body = Map::new();
    body.insert("value".to_string(), JsonValue::String(value));
    if pattern.case_insensitive {
        body.insert("case_insensitive".to_string(), JsonValue::Bool(true));
    }
    json!({ kind: { property: body } })
}

/// Escapes wildcard query metacharacters.
fn escape_wildcard(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '*' | '?' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn must(mut clauses: Vec<JsonValue>) -> Option<JsonValue> {
    match clauses.len() {
        0 => None,
        1 => clauses.pop(),
        _ => Some(json!({ "bool": { "must": clauses } })),
    }
}

fn should(mut clauses: Vec<JsonValue>) -> Option<JsonValue> {
    match clauses.len() {
        0 => None,
        1 => clauses.pop(),
        _ => Some(json!({ "bool": { "should": clauses, "minimum_should_match": 1 } })),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::field::FieldType;
    use crate::types::{ConditionErrorMessage, Value};

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

    fn compile(group: ValuesGroup) -> GenerationResult<JsonValue> {
        let mut generator = EsConditionGenerator::new();
        generator.set_field("id", "user_id").set_field("name", "name");
        generator.apply(&SearchCondition::new(field_set(), group))
    }

    fn int(i: i64) -> SingleValue {
        SingleValue::from_value(i)
    }

    #[test]
    fn test_terms_and_range() {
        let bag = ValuesBag::new()
            .with_simple_value(int(1))
            .with_simple_value(int(2))
            .with_range(Range::new(int(10), int(20), true, false));
        let query = compile(ValuesGroup::default().with_field("id", bag)).unwrap();
        assert_eq!(
            query,
            json!({ "bool": {
                "should": [
                    { "terms": { "user_id": [1, 2] } },
                    { "range": { "user_id": { "gte": 10, "lt": 20 } } }
                ],
                "minimum_should_match": 1
            } })
        );
    }

    #[test]
    fn test_exclusions_go_to_must_not() {
        let bag = ValuesBag::new()
            .with_comparison(Compare::new(int(5), CompareOperator::Greater))
            .with_excluded_simple_value(int(7));
        let query = compile(ValuesGroup::default().with_field("id", bag)).unwrap();
        assert_eq!(
            query,
            json!({ "bool": {
                "must": [{ "range": { "user_id": { "gt": 5 } } }],
                "must_not": [{ "term": { "user_id": 7 } }]
            } })
        );
    }

    #[test]
    fn test_groups() {
        let group = ValuesGroup::new(GroupLogical::Or)
            .with_field("id", ValuesBag::new().with_simple_value(int(1)))
            .with_group(ValuesGroup::default().with_field(
                "name",
                ValuesBag::new().with_simple_value(SingleValue::from_value("ann")),
            ));
        let query = compile(group).unwrap();
        assert_eq!(
            query,
            json!({ "bool": {
                "should": [
                    { "term": { "user_id": 1 } },
                    { "term": { "name": "ann" } }
                ],
                "minimum_should_match": 1
            } })
        );
    }

    #[test]
    fn test_patterns() {
        let bag = ValuesBag::new()
            .with_pattern_match(PatternMatch::new("a*b", PatternMatchType::Contains, true))
            .with_pattern_match(PatternMatch::new("x", PatternMatchType::NotStartsWith, false));
        let query = compile(ValuesGroup::default().with_field("name", bag)).unwrap();
        assert_eq!(
            query,
            json!({ "bool": {
                "must": [{ "wildcard": { "name": { "value": "*a\\*b*", "case_insensitive": true } } }],
                "must_not": [{ "prefix": { "name": { "value": "x" } } }]
            } })
        );
    }

    #[test]
    fn test_empty_condition_matches_all() {
        let query = compile(ValuesGroup::default()).unwrap();
        assert_eq!(query, json!({ "match_all": {} }));
    }

    #[test]
    fn test_errors() {
        let mut bag = ValuesBag::new().with_simple_value(int(1));
        bag.add_error(ConditionErrorMessage::new("[id][0]", "invalid", []));
        assert_eq!(
            compile(ValuesGroup::default().with_field("id", bag)).unwrap_err(),
            GenerationError::InvalidCondition { count: 1 }
        );

        let generator = EsConditionGenerator::new();
        let condition = SearchCondition::new(
            field_set(),
            ValuesGroup::default().with_field("id", ValuesBag::new().with_simple_value(int(1))),
        );
        assert!(matches!(
            generator.apply(&condition),
            Err(GenerationError::MissingFieldMapping { .. })
        ));
    }

    #[test]
    fn test_decimal_and_date_values() {
        use chrono::NaiveDate;
        use rust_decimal::Decimal;

        assert_eq!(json_value(&Value::Decimal(Decimal::new(1050, 2))), json!("10.50"));
        let date = NaiveDate::from_ymd_opt(2020, 2, 29).unwrap();
        assert_eq!(json_value(&Value::Date(date)), json!("2020-02-29"));
    }
}
