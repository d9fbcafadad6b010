//! Validation pass.

use std::cmp::Ordering;

use regex::Regex;

use crate::field::{FieldConfig, FieldSet};
use crate::types::{
    ConditionErrorMessage, PatternMatchType, Range, SingleValue, ValueKind, ValuesBag,
    ValuesGroup,
};

use super::ConditionOptimizer;

/// Checks every bag against its field configuration.
///
/// Problems are recorded as [`ConditionErrorMessage`]s on the bag; nothing is
/// removed. A message that is already present is not added again.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl ConditionOptimizer for Validator {
    fn name(&self) -> &'static str {
        "validator"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn apply(&self, group: &mut ValuesGroup, field_set: &FieldSet, path: &str) {
        for (name, bag) in group.fields.iter_mut() {
            let field_path = format!("{}[{}]", path, name);
            let mut errors = Vec::new();

            match field_set.get(name) {
                Some(field) => validate_bag(field, bag, path, &field_path, &mut errors),
                None => errors.push(ConditionErrorMessage::new(
                    field_path,
                    "Field {{ field }} is not searchable.",
                    [("field", name.clone())],
                )),
            }

            for error in errors {
                if !bag.errors.contains(&error) {
                    bag.add_error(error);
                }
            }
        }
    }
}

fn validate_bag(
    field: &FieldConfig,
    bag: &ValuesBag,
    group_path: &str,
    field_path: &str,
    errors: &mut Vec<ConditionErrorMessage>,
) {
    for kind in bag.kinds() {
        if !field.accepts(kind) {
            errors.push(ConditionErrorMessage::new(
                field_path,
                "This field does not accept {{ kind }} values.",
                [("kind", kind.to_string())],
            ));
        }
    }

    let needs_comparator = bag.has(ValueKind::Range)
        || bag.has(ValueKind::ExcludedRange)
        || bag.has(ValueKind::Comparison);
    if needs_comparator && field.comparator().is_none() {
        errors.push(ConditionErrorMessage::new(
            field_path,
            "This field has no comparator, ranges and comparisons are not supported.",
            [],
        ));
    }

    // Values are numbered in bag order.
    let mut index = 0;
    let mut next_path = || {
        let path = ValuesGroup::value_path(group_path, field.name(), index);
        index += 1;
        path
    };

    for value in bag
        .simple_values
        .iter()
        .chain(bag.excluded_simple_values.iter())
    {
        let path = next_path();
        check_value(field, value, &path, errors);
    }

    for range in bag.ranges.iter().chain(bag.excluded_ranges.iter()) {
        let path = next_path();
        check_value(field, &range.lower, &path, errors);
        check_value(field, &range.upper, &path, errors);
        check_range_order(field, range, &path, errors);
    }

    for compare in &bag.comparisons {
        let path = next_path();
        check_value(field, &compare.value, &path, errors);
    }

    for pattern in &bag.pattern_matchers {
        let path = next_path();
        if pattern.match_type.positive() == PatternMatchType::Regex {
            if let Err(err) = Regex::new(&pattern.value) {
                errors.push(ConditionErrorMessage::new(
                    path,
                    "This value is not a valid regular expression.",
                    [("pattern", pattern.value.clone()), ("error", err.to_string())],
                ));
            }
        }
    }
}

fn check_value(
    field: &FieldConfig,
    value: &SingleValue,
    path: &str,
    errors: &mut Vec<ConditionErrorMessage>,
) {
    if !field.field_type().accepts_value(&value.value) {
        errors.push(ConditionErrorMessage::new(
            path,
            "This value is not a valid {{ type }}.",
            [("type", field.field_type().to_string())],
        ));
        return;
    }

    for constraint in field.constraints() {
        if let Some((template, parameters)) = constraint.check(&value.value) {
            errors.push(ConditionErrorMessage::new(path, template, parameters));
        }
    }
}

fn check_range_order(
    field: &FieldConfig,
    range: &Range,
    path: &str,
    errors: &mut Vec<ConditionErrorMessage>,
) {
    let Some(comparator) = field.comparator() else {
        return;
    };

    match comparator.compare(&range.lower.value, &range.upper.value) {
        Some(Ordering::Greater) => errors.push(ConditionErrorMessage::new(
            path,
            "Lower range-value {{ lower }} should be lower than upper range-value {{ upper }}.",
            [
                ("lower", range.lower.view.clone()),
                ("upper", range.upper.view.clone()),
            ],
        )),
        None => errors.push(ConditionErrorMessage::new(
            path,
            "Range-values {{ lower }} and {{ upper }} cannot be compared.",
            [
                ("lower", range.lower.view.clone()),
                ("upper", range.upper.view.clone()),
            ],
        )),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Constraint, FieldType};
    use crate::types::{PatternMatch, Value};

    fn field_set() -> FieldSet {
        FieldSet::builder("test")
            .add(
                FieldConfig::builder("id", FieldType::Integer)
                    .accept_ranges()
                    .constraint(Constraint::Max(Value::Integer(100)))
                    .build(),
            )
            .add(
                FieldConfig::builder("name", FieldType::Text)
                    .accept_pattern_matches()
                    .build(),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_inverted_range() {
        let mut group = ValuesGroup::default().with_field(
            "id",
            ValuesBag::new().with_range(Range::inclusive(
                SingleValue::from_value(10),
                SingleValue::from_value(5),
            )),
        );
        Validator.apply(&mut group, &field_set(), "");

        let errors = &group.field("id").unwrap().errors;
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "[id][0]");
        assert_eq!(
            errors[0].message,
            "Lower range-value 10 should be lower than upper range-value 5."
        );
    }

    #[test]
    fn test_constraint_and_unaccepted_kind() {
        let mut group = ValuesGroup::default().with_field(
            "id",
            ValuesBag::new()
                .with_simple_value(SingleValue::from_value(1))
                .with_simple_value(SingleValue::from_value(101))
                .with_pattern_match(PatternMatch::new("x", PatternMatchType::Contains, false)),
        );
        Validator.apply(&mut group, &field_set(), "[2]");

        let errors = &group.field("id").unwrap().errors;
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.path == "[2][id]"
            && e.message == "This field does not accept pattern-match values."));
        assert!(errors
            .iter()
            .any(|e| e.path == "[2][id][1]" && e.message == "This value should be 100 or less."));
    }

    #[test]
    fn test_invalid_regex_and_type_mismatch() {
        let mut group = ValuesGroup::default().with_field(
            "name",
            ValuesBag::new()
                .with_simple_value(SingleValue::from_value(5))
                .with_pattern_match(PatternMatch::new("(", PatternMatchType::NotRegex, false)),
        );
        Validator.apply(&mut group, &field_set(), "");

        let errors = &group.field("name").unwrap().errors;
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "This value is not a valid text.");
        assert_eq!(errors[1].path, "[name][1]");
    }

    #[test]
    fn test_unknown_field_and_no_duplicate_messages() {
        let mut group = ValuesGroup::default().with_field(
            "ghost",
            ValuesBag::new().with_simple_value(SingleValue::from_value("x")),
        );
        Validator.apply(&mut group, &field_set(), "");
        Validator.apply(&mut group, &field_set(), "");

        let errors = &group.field("ghost").unwrap().errors;
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Field ghost is not searchable.");
    }
}
