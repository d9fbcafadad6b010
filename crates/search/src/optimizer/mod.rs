//! Condition optimizer chain.
//!
//! Optimizers are stateless passes run over a condition tree before it is
//! handed to a generator. The chain sorts them by priority (highest first)
//! and runs each pass over the whole tree, top-down, before the next pass
//! starts.
//!
//! | Pass | Priority | Effect |
//! |------|----------|--------|
//! | [`Validator`] | 100 | records validation messages |
//! | [`DuplicateRemove`] | 80 | removes duplicate values |
//! | [`RangeNormalizer`] | 60 | canonicalizes and merges ranges |
//! | [`ValuesToRange`] | 40 | merges consecutive single values into ranges |
//! | [`CompareNormalizer`] | 20 | folds comparison pairs into ranges |
//!
//! Passes after the validator leave bags with validation messages alone.
//! Running the default chain on an already optimized tree changes nothing.

mod compare_normalizer;
mod duplicate_remove;
mod range_normalizer;
mod validator;
mod values_to_range;

use std::cmp::Ordering;
use std::fmt::Debug;
use std::sync::Arc;

use tracing::debug;

use crate::field::{FieldConfig, FieldSet, ValueComparator};
use crate::types::{SearchCondition, Value, ValuesBag, ValuesGroup};

pub use compare_normalizer::CompareNormalizer;
pub use duplicate_remove::DuplicateRemove;
pub use range_normalizer::RangeNormalizer;
pub use validator::Validator;
pub use values_to_range::ValuesToRange;

/// A single optimization pass.
pub trait ConditionOptimizer: Send + Sync + Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Higher priorities run first.
    fn priority(&self) -> i32;

    /// Applies the pass to one group (not its children).
    ///
    /// `path` locates the group in the tree, for validation messages.
    fn apply(&self, group: &mut ValuesGroup, field_set: &FieldSet, path: &str);
}

/// An ordered list of optimizers.
#[derive(Debug, Clone)]
pub struct ConditionOptimizerChain {
    optimizers: Vec<Arc<dyn ConditionOptimizer>>,
}

impl Default for ConditionOptimizerChain {
    /// The five built-in passes.
    fn default() -> Self {
        Self::empty()
            .with(Validator)
            .with(DuplicateRemove)
            .with(RangeNormalizer)
            .with(ValuesToRange)
            .with(CompareNormalizer)
    }
}

impl ConditionOptimizerChain {
    /// Creates a chain without passes.
    pub fn empty() -> Self {
        Self {
            optimizers: Vec::new(),
        }
    }

    /// Adds a pass, keeping the chain sorted by priority.
    pub fn with(mut self, optimizer: impl ConditionOptimizer + 'static) -> Self {
        self.optimizers.push(Arc::new(optimizer));
        // stable: equal priorities keep insertion order
        self.optimizers
            .sort_by_key(|optimizer| std::cmp::Reverse(optimizer.priority()));
        self
    }

    /// Names of the passes in execution order.
    pub fn names(&self) -> Vec<&'static str> {
        self.optimizers.iter().map(|o| o.name()).collect()
    }

    /// Optimizes a condition in place.
    pub fn apply(&self, condition: &mut SearchCondition) {
        let field_set = Arc::clone(condition.field_set());
        self.apply_group(condition.values_group_mut(), &field_set);
    }

    /// Optimizes a root group in place and refreshes its error flags.
    pub fn apply_group(&self, root: &mut ValuesGroup, field_set: &FieldSet) {
        let before = root.count_values();
        for optimizer in &self.optimizers {
            walk(optimizer.as_ref(), root, field_set, "");
        }
        let has_errors = root.refresh_errors();

        debug!(
            passes = self.optimizers.len(),
            values_before = before,
            values_after = root.count_values(),
            has_errors,
            "Optimized search condition"
        );
    }
}

fn walk(optimizer: &dyn ConditionOptimizer, group: &mut ValuesGroup, field_set: &FieldSet, path: &str) {
    optimizer.apply(group, field_set, path);
    for (idx, child) in group.groups.iter_mut().enumerate() {
        let child_path = ValuesGroup::child_path(path, idx);
        walk(optimizer, child, field_set, &child_path);
    }
}

/// Calls `f` for every error-free bag of a known field.
pub(crate) fn for_each_clean_bag<F>(group: &mut ValuesGroup, field_set: &FieldSet, mut f: F)
where
    F: FnMut(&FieldConfig, &mut ValuesBag),
{
    for (name, bag) in group.fields.iter_mut() {
        if bag.has_errors() {
            continue;
        }
        if let Some(field) = field_set.get(name) {
            f(field, bag);
        }
    }
}

/// Total order used for sorting: by value shape, then by the comparator.
pub(crate) fn sort_order(comparator: &dyn ValueComparator, a: &Value, b: &Value) -> Ordering {
    a.type_name()
        .cmp(b.type_name())
        .then_with(|| comparator.compare(a, b).unwrap_or(Ordering::Equal))
}
