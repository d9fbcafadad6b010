//! Condition building shared by the input processors.
//!
//! Both the string query parser and the structured input funnel every value
//! through [`GroupScope::add_value`], so kind checks, value limits and
//! transformation errors behave the same regardless of the input format.

use std::collections::HashMap;

use crate::error::{LimitError, SearchResult, SemanticError};
use crate::field::FieldConfig;
use crate::types::{
    Compare, CompareOperator, ConditionErrorMessage, PatternMatch, PatternMatchType, Range,
    SingleValue, ValueKind, ValuesBag, ValuesGroup,
};

use super::ProcessorConfig;

/// A value as given by the user, before transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RawValue {
    Single {
        view: String,
        excluded: bool,
    },
    Range {
        lower: String,
        upper: String,
        inclusive_lower: bool,
        inclusive_upper: bool,
        excluded: bool,
    },
    Compare {
        view: String,
        operator: CompareOperator,
    },
    Pattern {
        value: String,
        match_type: PatternMatchType,
        case_insensitive: bool,
    },
}

impl RawValue {
    pub(crate) fn kind(&self) -> ValueKind {
        match self {
            RawValue::Single { excluded: false, .. } => ValueKind::Single,
            RawValue::Single { excluded: true, .. } => ValueKind::Excluded,
            RawValue::Range {
                excluded: false, ..
            } => ValueKind::Range,
            RawValue::Range { excluded: true, .. } => ValueKind::ExcludedRange,
            RawValue::Compare { .. } => ValueKind::Comparison,
            RawValue::Pattern { .. } => ValueKind::PatternMatch,
        }
    }
}

/// Position of the group being built, plus per-field value counters.
#[derive(Debug)]
pub(crate) struct GroupScope {
    pub(crate) path: String,
    pub(crate) index: usize,
    pub(crate) level: usize,
    counts: HashMap<String, usize>,
}

impl GroupScope {
    pub(crate) fn root() -> Self {
        Self {
            path: String::new(),
            index: 0,
            level: 0,
            counts: HashMap::new(),
        }
    }

    /// Scope of the `index`th child group.
    pub(crate) fn child(&self, index: usize) -> Self {
        Self {
            path: ValuesGroup::child_path(&self.path, index),
            index,
            level: self.level + 1,
            counts: HashMap::new(),
        }
    }

    pub(crate) fn check_nesting(&self, config: &ProcessorConfig) -> Result<(), LimitError> {
        if self.level > config.max_nesting_level {
            return Err(LimitError::GroupsNesting {
                max: config.max_nesting_level,
                group_idx: self.index,
                nesting_level: self.level,
            });
        }
        Ok(())
    }

    /// Checks the number of child groups this group is about to hold.
    pub(crate) fn check_groups(
        &self,
        count: usize,
        config: &ProcessorConfig,
    ) -> Result<(), LimitError> {
        if count > config.max_groups {
            return Err(LimitError::GroupsOverflow {
                max: config.max_groups,
                count,
                group_idx: self.index,
                nesting_level: self.level,
            });
        }
        Ok(())
    }

    /// Claims the next value slot of a field, enforcing its value limit.
    fn reserve(&mut self, field: &FieldConfig, config: &ProcessorConfig) -> Result<usize, LimitError> {
        let max = field.max_values().unwrap_or(config.max_values);
        let count = self.counts.entry(field.name().to_string()).or_insert(0);
        *count += 1;
        if *count > max {
            return Err(LimitError::ValuesOverflow {
                field: field.name().to_string(),
                max,
                count: *count,
                group_idx: self.index,
                nesting_level: self.level,
            });
        }
        Ok(*count - 1)
    }

    /// Adds one value of `field` to `group`.
    ///
    /// Unaccepted kinds and exceeded limits are fatal. A view the field type
    /// cannot transform is recorded as a validation message on the bag and
    /// the value is left out.
    pub(crate) fn add_value(
        &mut self,
        group: &mut ValuesGroup,
        field: &FieldConfig,
        raw: RawValue,
        config: &ProcessorConfig,
    ) -> SearchResult<()> {
        let kind = raw.kind();
        if !field.accepts(kind) {
            return Err(SemanticError::UnsupportedValueType {
                field: field.name().to_string(),
                kind,
            }
            .into());
        }

        let index = self.reserve(field, config)?;
        let path = ValuesGroup::value_path(&self.path, field.name(), index);
        let bag = group.field_mut(field.name());

        match raw {
            RawValue::Single { view, excluded } => {
                if let Some(value) = transform(field, &view, &path, bag) {
                    if excluded {
                        bag.excluded_simple_values.push(value);
                    } else {
                        bag.simple_values.push(value);
                    }
                }
            }
            RawValue::Range {
                lower,
                upper,
                inclusive_lower,
                inclusive_upper,
                excluded,
            } => {
                let lower = transform(field, &lower, &path, bag);
                let upper = transform(field, &upper, &path, bag);
                if let (Some(lower), Some(upper)) = (lower, upper) {
                    let range = Range::new(lower, upper, inclusive_lower, inclusive_upper);
                    if excluded {
                        bag.excluded_ranges.push(range);
                    } else {
                        bag.ranges.push(range);
                    }
                }
            }
            RawValue::Compare { view, operator } => {
                if let Some(value) = transform(field, &view, &path, bag) {
                    bag.comparisons.push(Compare::new(value, operator));
                }
            }
            RawValue::Pattern {
                value,
                match_type,
                case_insensitive,
            } => {
                bag.pattern_matchers
                    .push(PatternMatch::new(value, match_type, case_insensitive));
            }
        }
        Ok(())
    }
}

fn transform(
    field: &FieldConfig,
    view: &str,
    path: &str,
    bag: &mut ValuesBag,
) -> Option<SingleValue> {
    match field.field_type().transform(view) {
        Ok(value) => Some(SingleValue::new(value, view)),
        Err(reason) => {
            bag.add_error(ConditionErrorMessage::new(path, reason, []));
            None
        }
    }
}
