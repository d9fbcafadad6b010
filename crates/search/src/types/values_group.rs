//! Boolean-connected condition nodes.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::{ConditionErrorMessage, group_path, value_path};
use super::values_bag::ValuesBag;

/// Logical connector of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupLogical {
    /// All fields and child groups must match.
    #[default]
    And,
    /// At least one field or child group must match.
    Or,
}

impl GroupLogical {
    /// SQL keyword for this connector.
    pub fn as_sql(&self) -> &'static str {
        match self {
            GroupLogical::And => "AND",
            GroupLogical::Or => "OR",
        }
    }
}

impl fmt::Display for GroupLogical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A node of the condition tree.
///
/// Each field appears at most once per group; all values given for it are
/// collected in a single [`ValuesBag`].
#[derive(Debug, Clone, Default)]
pub struct ValuesGroup {
    /// How fields and child groups are combined.
    pub logical: GroupLogical,
    /// Field name to values.
    pub fields: BTreeMap<String, ValuesBag>,
    /// Nested groups, in input order.
    pub groups: Vec<ValuesGroup>,
    has_errors: bool,
}

impl PartialEq for ValuesGroup {
    fn eq(&self, other: &Self) -> bool {
        self.logical == other.logical && self.fields == other.fields && self.groups == other.groups
    }
}

impl ValuesGroup {
    /// Creates an empty group.
    pub fn new(logical: GroupLogical) -> Self {
        Self {
            logical,
            ..Default::default()
        }
    }

    /// Adds (or replaces) the bag of a field.
    pub fn with_field(mut self, name: impl Into<String>, bag: ValuesBag) -> Self {
        self.fields.insert(name.into(), bag);
        self
    }

    /// Adds a child group.
    pub fn with_group(mut self, group: ValuesGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Returns the bag of a field.
    pub fn field(&self, name: &str) -> Option<&ValuesBag> {
        self.fields.get(name)
    }

    /// Returns the bag of a field, creating an empty one when missing.
    pub fn field_mut(&mut self, name: &str) -> &mut ValuesBag {
        self.fields.entry(name.to_string()).or_default()
    }

    /// Returns true if neither this group nor any descendant holds values.
    pub fn is_empty(&self) -> bool {
        self.fields.values().all(ValuesBag::is_empty) && self.groups.iter().all(Self::is_empty)
    }

    /// Total number of values in this group and its descendants.
    pub fn count_values(&self) -> usize {
        self.fields.values().map(ValuesBag::count).sum::<usize>()
            + self.groups.iter().map(Self::count_values).sum::<usize>()
    }

    /// Marks this group as having errors.
    pub fn set_has_errors(&mut self, has_errors: bool) {
        self.has_errors = has_errors;
    }

    /// Returns true if this group, one of its bags or a descendant has errors.
    pub fn has_errors(&self) -> bool {
        self.has_errors
            || self.fields.values().any(ValuesBag::has_errors)
            || self.groups.iter().any(Self::has_errors)
    }

    /// Recomputes the error flag of this group and every descendant.
    pub fn refresh_errors(&mut self) -> bool {
        let mut has_errors = self.fields.values().any(ValuesBag::has_errors);
        for group in &mut self.groups {
            has_errors |= group.refresh_errors();
        }
        self.has_errors = has_errors;
        has_errors
    }

    /// Collects every validation message of the tree.
    pub fn collect_errors(&self) -> Vec<ConditionErrorMessage> {
        let mut errors = Vec::new();
        self.collect_errors_into(&mut errors);
        errors
    }

    fn collect_errors_into(&self, errors: &mut Vec<ConditionErrorMessage>) {
        for bag in self.fields.values() {
            errors.extend(bag.errors.iter().cloned());
        }
        for group in &self.groups {
            group.collect_errors_into(errors);
        }
    }

    /// Removes all validation messages from the tree.
    pub fn clear_errors(&mut self) {
        for bag in self.fields.values_mut() {
            bag.errors.clear();
        }
        for group in &mut self.groups {
            group.clear_errors();
        }
        self.has_errors = false;
    }

    /// Path of a value of `field` in a group located at `path`.
    pub fn value_path(path: &str, field: &str, index: usize) -> String {
        value_path(path, field, index)
    }

    /// Path of the `index`th child of a group located at `path`.
    pub fn child_path(path: &str, index: usize) -> String {
        group_path(path, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SingleValue;

    #[test]
    fn test_empty_groups() {
        let group = ValuesGroup::new(GroupLogical::And)
            .with_field("id", ValuesBag::new())
            .with_group(ValuesGroup::new(GroupLogical::Or));
        assert!(group.is_empty());
        assert_eq!(group.count_values(), 0);
    }

    #[test]
    fn test_errors_bubble_up() {
        let mut inner = ValuesBag::new().with_simple_value(SingleValue::from_value(1));
        inner.add_error(ConditionErrorMessage::new("[0][id][0]", "bad", []));

        let mut root = ValuesGroup::new(GroupLogical::And).with_group(
            ValuesGroup::new(GroupLogical::Or).with_field("id", inner),
        );

        assert!(root.has_errors());
        assert!(root.refresh_errors());
        assert_eq!(root.collect_errors().len(), 1);

        root.clear_errors();
        assert!(!root.has_errors());
    }

    #[test]
    fn test_field_mut_creates_bag() {
        let mut group = ValuesGroup::default();
        group
            .field_mut("name")
            .simple_values
            .push(SingleValue::from_value("foo"));
        assert_eq!(group.field("name").map(ValuesBag::count), Some(1));
    }
}
