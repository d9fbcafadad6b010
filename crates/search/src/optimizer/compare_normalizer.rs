//! Comparison folding pass.

use std::cmp::Ordering;

use crate::field::{FieldConfig, FieldSet};
use crate::types::{Compare, Range, ValueKind, ValuesBag, ValuesGroup};

use super::values_to_range::finalize_bag;
use super::{ConditionOptimizer, for_each_clean_bag};

/// Folds a lower-bound and an upper-bound comparison into a range.
///
/// `>=5` and `<=10` on the same field become the range `5-10`. Only bags
/// holding exactly one lower-bound comparison (`>`, `>=`) and exactly one
/// upper-bound comparison (`<`, `<=`) are folded, and only when the field
/// accepts ranges and the bounds are in order. `<>` comparisons stay as
/// they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompareNormalizer;

impl ConditionOptimizer for CompareNormalizer {
    fn name(&self) -> &'static str {
        "compare-normalizer"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn apply(&self, group: &mut ValuesGroup, field_set: &FieldSet, _path: &str) {
        for_each_clean_bag(group, field_set, |field, bag| {
            if fold(field, bag) {
                finalize_bag(field, bag);
            }
        });
    }
}

fn fold(field: &FieldConfig, bag: &mut ValuesBag) -> bool {
    if !field.accepts(ValueKind::Range) {
        return false;
    }
    let Some(comparator) = field.comparator() else {
        return false;
    };

    let lower: Vec<usize> = positions(bag, |c| c.operator.is_lower_bound());
    let upper: Vec<usize> = positions(bag, |c| c.operator.is_upper_bound());
    let (&[lower_idx], &[upper_idx]) = (lower.as_slice(), upper.as_slice()) else {
        return false;
    };

    let lower = &bag.comparisons[lower_idx];
    let upper = &bag.comparisons[upper_idx];
    let in_order = match comparator.compare(&lower.value.value, &upper.value.value) {
        Some(Ordering::Less) => true,
        Some(Ordering::Equal) => lower.operator.is_inclusive() && upper.operator.is_inclusive(),
        _ => false,
    };
    if !in_order {
        return false;
    }

    let range = Range::new(
        lower.value.clone(),
        upper.value.clone(),
        lower.operator.is_inclusive(),
        upper.operator.is_inclusive(),
    );

    let mut idx = 0;
    bag.comparisons.retain(|_| {
        let keep = idx != lower_idx && idx != upper_idx;
        idx += 1;
        keep
    });
    bag.ranges.push(range);
    true
}

fn positions(bag: &ValuesBag, pred: impl Fn(&Compare) -> bool) -> Vec<usize> {
    bag.comparisons
        .iter()
        .enumerate()
        .filter(|(_, c)| pred(c))
        .map(|(idx, _)| idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldType;
    use crate::types::{CompareOperator, SingleValue};

    fn compare(value: i64, operator: CompareOperator) -> Compare {
        Compare::new(SingleValue::from_value(value), operator)
    }

    fn field() -> FieldConfig {
        FieldConfig::builder("age", FieldType::Integer)
            .accept_ranges()
            .accept_comparisons()
            .build()
    }

    #[test]
    fn test_folds_bounds_into_range() {
        let mut bag = ValuesBag::new()
            .with_comparison(compare(5, CompareOperator::GreaterOrEqual))
            .with_comparison(compare(3, CompareOperator::NotEqual))
            .with_comparison(compare(10, CompareOperator::Lower));

        assert!(fold(&field(), &mut bag));
        assert_eq!(bag.comparisons, vec![compare(3, CompareOperator::NotEqual)]);
        assert_eq!(
            bag.ranges,
            vec![Range::new(
                SingleValue::from_value(5),
                SingleValue::from_value(10),
                true,
                false
            )]
        );
    }

    #[test]
    fn test_inverted_bounds_not_folded() {
        let mut bag = ValuesBag::new()
            .with_comparison(compare(10, CompareOperator::Greater))
            .with_comparison(compare(5, CompareOperator::Lower));
        assert!(!fold(&field(), &mut bag));
        assert_eq!(bag.comparisons.len(), 2);
    }

    #[test]
    fn test_multiple_lower_bounds_not_folded() {
        let mut bag = ValuesBag::new()
            .with_comparison(compare(1, CompareOperator::Greater))
            .with_comparison(compare(2, CompareOperator::Greater))
            .with_comparison(compare(5, CompareOperator::Lower));
        assert!(!fold(&field(), &mut bag));
    }

    #[test]
    fn test_requires_range_acceptance() {
        let field = FieldConfig::builder("age", FieldType::Integer)
            .accept_comparisons()
            .build();
        let mut bag = ValuesBag::new()
            .with_comparison(compare(1, CompareOperator::Greater))
            .with_comparison(compare(5, CompareOperator::Lower));
        assert!(!fold(&field, &mut bag));
    }
}
