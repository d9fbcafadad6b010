//! Export to the textual query syntax.

use crate::types::{GroupLogical, Range, SearchCondition, ValuesBag, ValuesGroup};

/// Writes a condition in the textual query syntax.
///
/// Values are written using their views; views that would not lex as a
/// single unquoted text are quoted.
///
/// ```
/// use std::sync::Arc;
/// use helios_search::export::StringQueryExporter;
/// use helios_search::field::{FieldConfig, FieldSet, FieldType};
/// use helios_search::input::StringQueryInput;
///
/// let field_set = Arc::new(
///     FieldSet::builder("users")
///         .add(FieldConfig::builder("id", FieldType::Integer).accept_ranges().build())
///         .build()
///         .unwrap(),
/// );
/// let condition = StringQueryInput::default()
///     .process("id: 1, 5-9, !3", &field_set)
///     .unwrap();
/// assert_eq!(StringQueryExporter::new().export(&condition), "id: 1, !3, 5-9");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct StringQueryExporter;

impl StringQueryExporter {
    /// Creates an exporter.
    pub fn new() -> Self {
        Self
    }

    /// Renders a condition in the query grammar.
    pub fn export(&self, condition: &SearchCondition) -> String {
        self.export_group(condition.values_group())
    }

    /// Exports a root group.
    pub fn export_group(&self, root: &ValuesGroup) -> String {
        let body = write_body(root);
        match (root.logical, body.is_empty()) {
            (GroupLogical::Or, true) => "*".to_string(),
            (GroupLogical::Or, false) => format!("* {}", body),
            (GroupLogical::And, _) => body,
        }
    }
}

fn write_body(group: &ValuesGroup) -> String {
    let mut parts = Vec::new();

    for (name, bag) in &group.fields {
        if !bag.is_empty() {
            parts.push(format!("{}: {}", name, write_values(bag)));
        }
    }
    for child in &group.groups {
        let marker = match child.logical {
            GroupLogical::Or => "*",
            GroupLogical::And => "",
        };
        parts.push(format!("{}({})", marker, write_body(child)));
    }

    parts.join("; ")
}

fn write_values(bag: &ValuesBag) -> String {
    let mut values: Vec<String> = Vec::with_capacity(bag.count());

    values.extend(bag.simple_values.iter().map(|v| quote(&v.view)));
    values.extend(
        bag.excluded_simple_values
            .iter()
            .map(|v| format!("!{}", quote(&v.view))),
    );
    values.extend(bag.ranges.iter().map(write_range));
    values.extend(
        bag.excluded_ranges
            .iter()
            .map(|r| format!("!{}", write_range(r))),
    );
    values.extend(
        bag.comparisons
            .iter()
            .map(|c| format!("{}{}", c.operator.as_str(), quote(&c.value.view))),
    );
    for pattern in &bag.pattern_matchers {
        let mut out = String::from("~");
        if pattern.case_insensitive {
            out.push('i');
        }
        if pattern.match_type.is_negated() {
            out.push('!');
        }
        out.push(pattern.match_type.symbol());
        out.push_str(&quote(&pattern.value));
        values.push(out);
    }

    values.join(", ")
}

fn write_range(range: &Range) -> String {
    format!(
        "{}{}-{}{}",
        if range.inclusive_lower { "" } else { "]" },
        quote(&range.lower.view),
        quote(&range.upper.view),
        if range.inclusive_upper { "" } else { "[" },
    )
}

/// Quotes a view unless it lexes as one unquoted text.
fn quote(view: &str) -> String {
    let simple = !view.is_empty()
        && view
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.');
    if simple {
        view.to_string()
    } else {
        format!("\"{}\"", view.replace('"', "\"\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        Compare, CompareOperator, PatternMatch, PatternMatchType, SingleValue, Value,
    };

    fn single(view: &str) -> SingleValue {
        SingleValue::new(Value::from(view), view)
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("abc_1"), "abc_1");
        assert_eq!(quote("10.5"), "10.5");
        assert_eq!(quote("-5"), "\"-5\"");
        assert_eq!(quote("2020-01-01"), "\"2020-01-01\"");
        assert_eq!(quote("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(quote(""), "\"\"");
    }

    #[test]
    fn test_export_groups_and_kinds() {
        let bag = ValuesBag::new()
            .with_simple_value(single("a"))
            .with_excluded_range(Range::new(single("b"), single("d"), false, true))
            .with_comparison(Compare::new(single("x"), CompareOperator::GreaterOrEqual))
            .with_pattern_match(PatternMatch::new("fo o", PatternMatchType::NotContains, true));
        let root = ValuesGroup::new(GroupLogical::Or)
            .with_field("name", bag)
            .with_group(ValuesGroup::new(GroupLogical::Or).with_field(
                "id",
                ValuesBag::new().with_excluded_simple_value(single("7")),
            ))
            .with_group(ValuesGroup::new(GroupLogical::And));

        assert_eq!(
            StringQueryExporter::new().export_group(&root),
            "* name: a, !]b-d, >=x, ~i!*\"fo o\"; *(id: !7); ()"
        );
    }

    #[test]
    fn test_export_empty_roots() {
        let exporter = StringQueryExporter::new();
        assert_eq!(exporter.export_group(&ValuesGroup::new(GroupLogical::And)), "");
        assert_eq!(exporter.export_group(&ValuesGroup::new(GroupLogical::Or)), "*");
    }
}
