//! The root search condition.

use std::sync::Arc;

use crate::field::FieldSet;

use super::errors::ConditionErrorMessage;
use super::values_group::ValuesGroup;

/// A field set together with the root group of a condition tree.
///
/// A condition is produced by an input processor (or built directly through
/// the API), adjusted by the optimizer chain and from then on only read.
/// Generators never write back into it.
#[derive(Debug, Clone)]
pub struct SearchCondition {
    field_set: Arc<FieldSet>,
    values_group: ValuesGroup,
}

impl SearchCondition {
    /// Creates a new search condition.
    pub fn new(field_set: Arc<FieldSet>, values_group: ValuesGroup) -> Self {
        Self {
            field_set,
            values_group,
        }
    }

    /// The field set the condition was built for.
    pub fn field_set(&self) -> &Arc<FieldSet> {
        &self.field_set
    }

    /// The root group.
    pub fn values_group(&self) -> &ValuesGroup {
        &self.values_group
    }

    /// Mutable access to the root group, used by the optimizer chain.
    pub fn values_group_mut(&mut self) -> &mut ValuesGroup {
        &mut self.values_group
    }

    /// Returns true if any node carries validation messages.
    ///
    /// Generators refuse to compile a condition for which this returns true.
    pub fn has_errors(&self) -> bool {
        self.values_group.has_errors()
    }

    /// All validation messages of the tree.
    pub fn errors(&self) -> Vec<ConditionErrorMessage> {
        self.values_group.collect_errors()
    }

    /// Returns true if the condition holds no values at all.
    pub fn is_empty(&self) -> bool {
        self.values_group.is_empty()
    }
}

impl PartialEq for SearchCondition {
    fn eq(&self, other: &Self) -> bool {
        self.field_set.name() == other.field_set.name() && self.values_group == other.values_group
    }
}
