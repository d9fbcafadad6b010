//! Consecutive values to range pass.

use crate::field::{FieldConfig, FieldSet, Incrementer, ValueComparator};
use crate::types::{Range, SingleValue, ValueKind, ValuesBag, ValuesGroup};

use super::range_normalizer::normalize_ranges;
use super::{ConditionOptimizer, for_each_clean_bag, sort_order};

/// Merges runs of consecutive single values into ranges.
///
/// Applies to fields with a comparator and an incrementer. Single values are
/// sorted, then every run of two or more values where each value is the
/// increment of the previous one becomes an inclusive range. Excluded values
/// are merged into excluded ranges independently. Each list is only merged
/// when the field accepts the resulting range kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValuesToRange;

impl ConditionOptimizer for ValuesToRange {
    fn name(&self) -> &'static str {
        "values-to-range"
    }

    fn priority(&self) -> i32 {
        40
    }

    fn apply(&self, group: &mut ValuesGroup, field_set: &FieldSet, _path: &str) {
        for_each_clean_bag(group, field_set, |field, bag| {
            if field.incrementer().is_some() {
                finalize_bag(field, bag);
            }
        });
    }
}

/// Normalizes ranges, merges consecutive values, then normalizes again so the
/// new ranges join existing ones.
pub(crate) fn finalize_bag(field: &FieldConfig, bag: &mut ValuesBag) {
    normalize_ranges(field, bag);
    if merge_consecutive(field, bag) {
        normalize_ranges(field, bag);
    }
}

/// Returns true if a range was created.
fn merge_consecutive(field: &FieldConfig, bag: &mut ValuesBag) -> bool {
    let (Some(comparator), Some(incrementer)) = (field.comparator(), field.incrementer()) else {
        return false;
    };

    let mut changed = false;
    if field.accepts(ValueKind::Range) {
        changed |= merge_list(
            comparator,
            incrementer,
            &mut bag.simple_values,
            &mut bag.ranges,
        );
    }
    if field.accepts(ValueKind::ExcludedRange) {
        changed |= merge_list(
            comparator,
            incrementer,
            &mut bag.excluded_simple_values,
            &mut bag.excluded_ranges,
        );
    }
    changed
}

fn merge_list(
    comparator: &dyn ValueComparator,
    incrementer: &dyn Incrementer,
    singles: &mut Vec<SingleValue>,
    ranges: &mut Vec<Range>,
) -> bool {
    if singles.len() < 2 {
        return false;
    }

    singles.sort_by(|a, b| sort_order(comparator, &a.value, &b.value));

    let mut kept = Vec::with_capacity(singles.len());
    let mut run: Vec<SingleValue> = Vec::new();
    let mut changed = false;

    for value in singles.drain(..) {
        let follows = run.last().is_some_and(|prev| {
            incrementer
                .increment(&prev.value)
                .is_some_and(|succ| comparator.is_equal(&succ, &value.value))
        });
        if !follows {
            changed |= flush(&mut run, &mut kept, ranges);
        }
        run.push(value);
    }
    changed |= flush(&mut run, &mut kept, ranges);

    *singles = kept;
    changed
}

fn flush(run: &mut Vec<SingleValue>, kept: &mut Vec<SingleValue>, ranges: &mut Vec<Range>) -> bool {
    if run.len() < 2 {
        kept.append(run);
        return false;
    }
    let mut values = run.drain(..);
    match (values.next(), values.next_back()) {
        (Some(first), Some(last)) => {
            ranges.push(Range::inclusive(first, last));
            true
        }
        _ => false,
    }
}
