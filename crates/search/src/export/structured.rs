//! Export to the structured form.

use crate::input::{
    StructuredCompare, StructuredField, StructuredGroup, StructuredPattern, StructuredRange,
};
use crate::types::{Range, SearchCondition, ValuesBag, ValuesGroup};

/// Converts a condition into a [`StructuredGroup`], which serializes to the
/// JSON form accepted by [`StructuredInput`](crate::input::StructuredInput).
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredExporter;

impl StructuredExporter {
    /// Creates an exporter.
    pub fn new() -> Self {
        Self
    }

    /// Converts a condition into its structured form.
    pub fn export(&self, condition: &SearchCondition) -> StructuredGroup {
        export_group(condition.values_group())
    }

    /// Exports a condition as JSON text.
    pub fn export_json(&self, condition: &SearchCondition) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.export(condition))
    }
}

fn export_group(group: &ValuesGroup) -> StructuredGroup {
    StructuredGroup {
        logical: group.logical,
        fields: group
            .fields
            .iter()
            .filter(|(_, bag)| !bag.is_empty())
            .map(|(name, bag)| (name.clone(), export_bag(bag)))
            .collect(),
        groups: group.groups.iter().map(export_group).collect(),
    }
}

fn export_bag(bag: &ValuesBag) -> StructuredField {
    StructuredField {
        simple_values: bag.simple_values.iter().map(|v| v.view.clone()).collect(),
        excluded_simple_values: bag
            .excluded_simple_values
            .iter()
            .map(|v| v.view.clone())
            .collect(),
        ranges: bag.ranges.iter().map(export_range).collect(),
        excluded_ranges: bag.excluded_ranges.iter().map(export_range).collect(),
        comparisons: bag
            .comparisons
            .iter()
            .map(|c| StructuredCompare {
                operator: c.operator,
                value: c.value.view.clone(),
            })
            .collect(),
        pattern_matchers: bag
            .pattern_matchers
            .iter()
            .map(|p| StructuredPattern {
                match_type: p.match_type,
                value: p.value.clone(),
                case_insensitive: p.case_insensitive,
            })
            .collect(),
    }
}

fn export_range(range: &Range) -> StructuredRange {
    StructuredRange {
        lower: range.lower.view.clone(),
        upper: range.upper.view.clone(),
        inclusive_lower: range.inclusive_lower,
        inclusive_upper: range.inclusive_upper,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GroupLogical, SingleValue};

    #[test]
    fn test_export_skips_empty_bags() {
        let group = ValuesGroup::new(GroupLogical::Or)
            .with_field("a", ValuesBag::new())
            .with_field(
                "b",
                ValuesBag::new().with_range(Range::new(
                    SingleValue::from_value(1),
                    SingleValue::from_value(4),
                    true,
                    false,
                )),
            );
        let exported = export_group(&group);
        assert_eq!(exported.logical, GroupLogical::Or);
        assert_eq!(exported.fields.len(), 1);
        let range = &exported.fields["b"].ranges[0];
        assert_eq!(range.lower, "1");
        assert!(!range.inclusive_upper);
    }
}
