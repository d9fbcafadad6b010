//! Per-field value container.

use super::errors::ConditionErrorMessage;
use super::value::{Compare, PatternMatch, Range, SingleValue, ValueKind};

/// All values given for one field inside one group.
///
/// The lists are independent: a bag may hold any mix of value kinds, limited
/// only by what the field accepts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValuesBag {
    /// Included single values.
    pub simple_values: Vec<SingleValue>,
    /// Excluded single values.
    pub excluded_simple_values: Vec<SingleValue>,
    /// Included ranges.
    pub ranges: Vec<Range>,
    /// Excluded ranges.
    pub excluded_ranges: Vec<Range>,
    /// Comparisons.
    pub comparisons: Vec<Compare>,
    /// Pattern matches.
    pub pattern_matchers: Vec<PatternMatch>,
    /// Validation messages for this bag.
    pub errors: Vec<ConditionErrorMessage>,
}

impl ValuesBag {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an included single value.
    pub fn with_simple_value(mut self, value: SingleValue) -> Self {
        self.simple_values.push(value);
        self
    }

    /// Adds an excluded single value.
    pub fn with_excluded_simple_value(mut self, value: SingleValue) -> Self {
        self.excluded_simple_values.push(value);
        self
    }

    /// Adds an included range.
    pub fn with_range(mut self, range: Range) -> Self {
        self.ranges.push(range);
        self
    }

    /// Adds an excluded range.
    pub fn with_excluded_range(mut self, range: Range) -> Self {
        self.excluded_ranges.push(range);
        self
    }

    /// Adds a comparison.
    pub fn with_comparison(mut self, compare: Compare) -> Self {
        self.comparisons.push(compare);
        self
    }

    /// Adds a pattern match.
    pub fn with_pattern_match(mut self, pattern: PatternMatch) -> Self {
        self.pattern_matchers.push(pattern);
        self
    }

    /// Total number of values over all lists.
    pub fn count(&self) -> usize {
        self.simple_values.len()
            + self.excluded_simple_values.len()
            + self.ranges.len()
            + self.excluded_ranges.len()
            + self.comparisons.len()
            + self.pattern_matchers.len()
    }

    /// Returns true if the bag holds no values.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Returns true if the bag holds values of the given kind.
    pub fn has(&self, kind: ValueKind) -> bool {
        match kind {
            ValueKind::Single => !self.simple_values.is_empty(),
            ValueKind::Excluded => !self.excluded_simple_values.is_empty(),
            ValueKind::Range => !self.ranges.is_empty(),
            ValueKind::ExcludedRange => !self.excluded_ranges.is_empty(),
            ValueKind::Comparison => !self.comparisons.is_empty(),
            ValueKind::PatternMatch => !self.pattern_matchers.is_empty(),
        }
    }

    /// Value kinds present in this bag.
    pub fn kinds(&self) -> Vec<ValueKind> {
        [
            ValueKind::Single,
            ValueKind::Excluded,
            ValueKind::Range,
            ValueKind::ExcludedRange,
            ValueKind::Comparison,
            ValueKind::PatternMatch,
        ]
        .into_iter()
        .filter(|kind| self.has(*kind))
        .collect()
    }

    /// Attaches a validation message.
    pub fn add_error(&mut self, error: ConditionErrorMessage) {
        self.errors.push(error);
    }

    /// Returns true if validation messages are attached.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
