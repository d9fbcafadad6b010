//! Duplicate removal pass.

use std::collections::HashSet;
use std::hash::Hash;

use crate::field::FieldSet;
use crate::types::ValuesGroup;

use super::{ConditionOptimizer, for_each_clean_bag};

/// Removes values that occur more than once in the same list.
///
/// The first occurrence (and its view) is kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicateRemove;

impl ConditionOptimizer for DuplicateRemove {
    fn name(&self) -> &'static str {
        "duplicate-remove"
    }

    fn priority(&self) -> i32 {
        80
    }

    fn apply(&self, group: &mut ValuesGroup, field_set: &FieldSet, _path: &str) {
        for_each_clean_bag(group, field_set, |_, bag| {
            dedup(&mut bag.simple_values);
            dedup(&mut bag.excluded_simple_values);
            dedup(&mut bag.ranges);
            dedup(&mut bag.excluded_ranges);
            dedup(&mut bag.comparisons);
            dedup(&mut bag.pattern_matchers);
        });
    }
}

fn dedup<T: Clone + Eq + Hash>(values: &mut Vec<T>) {
    let mut seen = HashSet::with_capacity(values.len());
    values.retain(|value| seen.insert(value.clone()));
}
