//! Stable condition fingerprints.

use std::fmt::Write;

use sha2::{Digest, Sha256};

use crate::types::{Range, SearchCondition, SingleValue, ValuesBag, ValuesGroup};

/// SHA-256 hex fingerprint of a condition compiled by a given backend.
///
/// Covers the field set name, the backend id and a canonical form of the
/// tree. Views are left out: two values that differ only in how they were
/// written produce the same fragment.
pub fn condition_fingerprint(condition: &SearchCondition, backend_id: &str) -> String {
    let mut canonical = String::new();
    write_group(&mut canonical, condition.values_group());

    let mut hasher = Sha256::new();
    hasher.update(condition.field_set().name().as_bytes());
    hasher.update([0u8]);
    hasher.update(backend_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

fn write_group(out: &mut String, group: &ValuesGroup) {
    let _ = write!(out, "{}(", group.logical);
    for (name, bag) in &group.fields {
        if bag.is_empty() {
            continue;
        }
        let _ = write!(out, "{}:{{", name.len());
        out.push_str(name);
        write_bag(out, bag);
        out.push('}');
    }
    for child in &group.groups {
        write_group(out, child);
    }
    out.push(')');
}

fn write_bag(out: &mut String, bag: &ValuesBag) {
    out.push_str("s[");
    bag.simple_values.iter().for_each(|v| write_value(out, v));
    out.push_str("]x[");
    bag.excluded_simple_values
        .iter()
        .for_each(|v| write_value(out, v));
    out.push_str("]r[");
    bag.ranges.iter().for_each(|r| write_range(out, r));
    out.push_str("]xr[");
    bag.excluded_ranges.iter().for_each(|r| write_range(out, r));
    out.push_str("]c[");
    for compare in &bag.comparisons {
        out.push_str(compare.operator.as_str());
        write_value(out, &compare.value);
    }
    out.push_str("]p[");
    for pattern in &bag.pattern_matchers {
        let _ = write!(
            out,
            "{}{}{}:",
            pattern.match_type.symbol(),
            if pattern.match_type.is_negated() { "!" } else { "" },
            if pattern.case_insensitive { "i" } else { "" },
        );
        let _ = write!(out, "{}:{}", pattern.value.len(), pattern.value);
    }
    out.push(']');
}

fn write_value(out: &mut String, value: &SingleValue) {
    let text = value.value.to_string();
    let _ = write!(out, "{}:{}:{};", value.value.type_name(), text.len(), text);
}

fn write_range(out: &mut String, range: &Range) {
    out.push(if range.inclusive_lower { '[' } else { ']' });
    write_value(out, &range.lower);
    write_value(out, &range.upper);
    out.push(if range.inclusive_upper { ']' } else { '[' });
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::field::{FieldConfig, FieldSet, FieldType};
    use crate::types::{GroupLogical, Value};

    fn field_set(name: &str) -> Arc<FieldSet> {
        Arc::new(
            FieldSet::builder(name)
                .add(FieldConfig::new("id", FieldType::Integer))
                .build()
                .unwrap(),
        )
    }

    fn condition(name: &str, logical: GroupLogical, value: SingleValue) -> SearchCondition {
        SearchCondition::new(
            field_set(name),
            ValuesGroup::new(logical).with_field("id", ValuesBag::new().with_simple_value(value)),
        )
    }

    #[test]
    fn test_fingerprint_is_stable_and_ignores_views() {
        let a = condition("users", GroupLogical::And, SingleValue::new(Value::Integer(7), "7"));
        let b = condition("users", GroupLogical::And, SingleValue::new(Value::Integer(7), "007"));
        let fp = condition_fingerprint(&a, "sql");
        assert_eq!(fp.len(), 64);
        assert_eq!(fp, condition_fingerprint(&b, "sql"));
    }

    #[test]
    fn test_fingerprint_distinguishes_inputs() {
        let base = condition("users", GroupLogical::And, SingleValue::from_value(7));
        let fp = condition_fingerprint(&base, "sql");

        assert_ne!(fp, condition_fingerprint(&base, "document"));
        assert_ne!(
            fp,
            condition_fingerprint(&condition("people", GroupLogical::And, SingleValue::from_value(7)), "sql")
        );
        assert_ne!(
            fp,
            condition_fingerprint(&condition("users", GroupLogical::Or, SingleValue::from_value(7)), "sql")
        );
        assert_ne!(
            fp,
            condition_fingerprint(&condition("users", GroupLogical::And, SingleValue::from_value("7")), "sql")
        );
    }
}
