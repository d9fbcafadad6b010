//! Range normalization pass.

use std::cmp::Ordering;

use crate::field::{FieldConfig, FieldSet, Incrementer, ValueComparator};
use crate::types::{Range, SingleValue, ValuesBag, ValuesGroup};

use super::{ConditionOptimizer, for_each_clean_bag, sort_order};

/// Brings ranges into canonical form.
///
/// For fields with a comparator, per bag (included and excluded lists
/// independently):
///
/// 1. exclusive bounds become inclusive when the field has an incrementer
/// 2. overlapping ranges (and adjacent ones, given an incrementer) merge
/// 3. inclusive ranges with equal bounds become single values
/// 4. single values covered by a range are dropped
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeNormalizer;

impl ConditionOptimizer for RangeNormalizer {
    fn name(&self) -> &'static str {
        "range-normalizer"
    }

    fn priority(&self) -> i32 {
        60
    }

    fn apply(&self, group: &mut ValuesGroup, field_set: &FieldSet, _path: &str) {
        for_each_clean_bag(group, field_set, normalize_ranges);
    }
}

/// Runs the range normalization on one bag.
pub(crate) fn normalize_ranges(field: &FieldConfig, bag: &mut ValuesBag) {
    let Some(comparator) = field.comparator() else {
        return;
    };
    let incrementer = field.incrementer();

    normalize_list(
        comparator,
        incrementer,
        &mut bag.ranges,
        &mut bag.simple_values,
    );
    normalize_list(
        comparator,
        incrementer,
        &mut bag.excluded_ranges,
        &mut bag.excluded_simple_values,
    );
}

fn normalize_list(
    comparator: &dyn ValueComparator,
    incrementer: Option<&dyn Incrementer>,
    ranges: &mut Vec<Range>,
    singles: &mut Vec<SingleValue>,
) {
    if ranges.is_empty() {
        return;
    }

    if let Some(incrementer) = incrementer {
        for range in ranges.iter_mut() {
            make_inclusive(comparator, incrementer, range);
        }
    }

    ranges.sort_by(|a, b| {
        sort_order(comparator, &a.lower.value, &b.lower.value)
            .then_with(|| b.inclusive_lower.cmp(&a.inclusive_lower))
    });

    let mut merged: Vec<Range> = Vec::with_capacity(ranges.len());
    for range in ranges.drain(..) {
        if let Some(last) = merged.last_mut() {
            if touches(comparator, incrementer, last, &range) {
                extend(comparator, last, range);
                continue;
            }
        }
        merged.push(range);
    }

    for range in merged {
        let collapsed = range.inclusive_lower
            && range.inclusive_upper
            && comparator.is_equal(&range.lower.value, &range.upper.value);
        if collapsed {
            if !singles.contains(&range.lower) {
                singles.push(range.lower);
            }
        } else {
            ranges.push(range);
        }
    }

    singles.retain(|single| {
        !ranges
            .iter()
            .any(|range| range_contains(comparator, range, single))
    });
}

/// Replaces exclusive bounds by the neighbouring inclusive value.
///
/// Left unchanged when that would invert the range.
fn make_inclusive(comparator: &dyn ValueComparator, incrementer: &dyn Incrementer, range: &mut Range) {
    let lower = if range.inclusive_lower {
        Some(range.lower.clone())
    } else {
        incrementer
            .increment(&range.lower.value)
            .map(SingleValue::from_value)
    };
    let upper = if range.inclusive_upper {
        Some(range.upper.clone())
    } else {
        incrementer
            .decrement(&range.upper.value)
            .map(SingleValue::from_value)
    };

    if let (Some(lower), Some(upper)) = (lower, upper) {
        if matches!(
            comparator.compare(&lower.value, &upper.value),
            Some(Ordering::Less | Ordering::Equal)
        ) {
            *range = Range::inclusive(lower, upper);
        }
    }
}

/// Whether `next` (sorted after `current`) overlaps or directly follows it.
fn touches(
    comparator: &dyn ValueComparator,
    incrementer: Option<&dyn Incrementer>,
    current: &Range,
    next: &Range,
) -> bool {
    match comparator.compare(&next.lower.value, &current.upper.value) {
        Some(Ordering::Less) => true,
        Some(Ordering::Equal) => current.inclusive_upper || next.inclusive_lower,
        Some(Ordering::Greater) => {
            current.inclusive_upper
                && next.inclusive_lower
                && incrementer
                    .and_then(|inc| inc.increment(&current.upper.value))
                    .is_some_and(|succ| comparator.is_equal(&succ, &next.lower.value))
        }
        None => false,
    }
}

fn extend(comparator: &dyn ValueComparator, current: &mut Range, next: Range) {
    if comparator.is_equal(&current.lower.value, &next.lower.value) {
        current.inclusive_lower |= next.inclusive_lower;
    }
    match comparator.compare(&next.upper.value, &current.upper.value) {
        Some(Ordering::Greater) => {
            current.upper = next.upper;
            current.inclusive_upper = next.inclusive_upper;
        }
        Some(Ordering::Equal) => current.inclusive_upper |= next.inclusive_upper,
        _ => {}
    }
}

/// Whether a single value lies within a range.
pub(crate) fn range_contains(
    comparator: &dyn ValueComparator,
    range: &Range,
    single: &SingleValue,
) -> bool {
    let above_lower = match comparator.compare(&range.lower.value, &single.value) {
        Some(Ordering::Less) => true,
        Some(Ordering::Equal) => range.inclusive_lower,
        _ => false,
    };
    let below_upper = match comparator.compare(&single.value, &range.upper.value) {
        Some(Ordering::Less) => true,
        Some(Ordering::Equal) => range.inclusive_upper,
        _ => false,
    };
    above_lower && below_upper
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldType, NaturalIncrementer};

    fn range(lower: i64, upper: i64) -> Range {
        Range::inclusive(SingleValue::from_value(lower), SingleValue::from_value(upper))
    }

    fn int_field(incremented: bool) -> FieldConfig {
        let builder = FieldConfig::builder("id", FieldType::Integer).accept_ranges();
        if incremented {
            builder.incrementer(NaturalIncrementer).build()
        } else {
            builder.build()
        }
    }

    #[test]
    fn test_merges_overlapping_ranges() {
        let mut bag = ValuesBag::new()
            .with_range(range(10, 20))
            .with_range(range(1, 5))
            .with_range(range(3, 12))
            .with_range(range(30, 40));
        normalize_ranges(&int_field(false), &mut bag);
        assert_eq!(bag.ranges, vec![range(1, 20), range(30, 40)]);
    }

    #[test]
    fn test_exclusive_bounds_become_inclusive() {
        let mut bag = ValuesBag::new().with_range(Range::new(
            SingleValue::from_value(1),
            SingleValue::from_value(10),
            false,
            false,
        ));
        normalize_ranges(&int_field(true), &mut bag);
        assert_eq!(bag.ranges, vec![range(2, 9)]);
        assert_eq!(bag.ranges[0].lower.view, "2");
    }

    #[test]
    fn test_exclusive_kept_without_incrementer() {
        let exclusive = Range::new(
            SingleValue::from_value(1),
            SingleValue::from_value(10),
            false,
            true,
        );
        let mut bag = ValuesBag::new().with_range(exclusive.clone());
        normalize_ranges(&int_field(false), &mut bag);
        assert_eq!(bag.ranges, vec![exclusive]);
    }

    #[test]
    fn test_adjacent_ranges_merge_with_incrementer() {
        let mut bag = ValuesBag::new()
            .with_range(range(1, 5))
            .with_range(range(6, 9));
        normalize_ranges(&int_field(true), &mut bag);
        assert_eq!(bag.ranges, vec![range(1, 9)]);

        let mut bag = ValuesBag::new()
            .with_range(range(1, 5))
            .with_range(range(6, 9));
        normalize_ranges(&int_field(false), &mut bag);
        assert_eq!(bag.ranges.len(), 2);
    }

    #[test]
    fn test_equal_bounds_collapse_and_covered_singles_drop() {
        let mut bag = ValuesBag::new()
            .with_simple_value(SingleValue::from_value(3))
            .with_simple_value(SingleValue::from_value(50))
            .with_range(range(1, 5))
            .with_range(range(7, 7))
            .with_excluded_simple_value(SingleValue::from_value(3));
        normalize_ranges(&int_field(false), &mut bag);

        assert_eq!(bag.ranges, vec![range(1, 5)]);
        assert_eq!(
            bag.simple_values,
            vec![SingleValue::from_value(50), SingleValue::from_value(7)]
        );
        // excluded values are not covered by included ranges
        assert_eq!(bag.excluded_simple_values.len(), 1);
    }
}
