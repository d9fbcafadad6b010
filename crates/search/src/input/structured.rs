//! The structured (array/object) condition form.
//!
//! ```json
//! {
//!   "logical": "AND",
//!   "fields": {
//!     "id": {
//!       "simple-values": ["1", "2"],
//!       "ranges": [{ "lower": "10", "upper": "20" }],
//!       "comparisons": [{ "operator": ">", "value": "100" }]
//!     },
//!     "name": {
//!       "pattern-matchers": [{ "type": "CONTAINS", "value": "foo", "case-insensitive": true }]
//!     }
//!   },
//!   "groups": [{ "logical": "OR", "fields": { "id": { "excluded-simple-values": ["5"] } } }]
//! }
//! ```
//!
//! Values are given by their textual view and transformed by the field type,
//! exactly like values of the string query syntax.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SearchResult, SemanticError};
use crate::field::FieldSet;
use crate::types::{CompareOperator, GroupLogical, PatternMatchType, SearchCondition, ValuesGroup};

use super::ProcessorConfig;
use super::values::{GroupScope, RawValue};

/// A group in structured form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct StructuredGroup {
    /// How fields and child groups combine.
    #[serde(default)]
    pub logical: GroupLogical,
    /// Field name to values.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, StructuredField>,
    /// Nested groups.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<StructuredGroup>,
}

/// The values of one field in structured form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct StructuredField {
    /// Included single values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub simple_values: Vec<String>,
    /// Excluded single values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_simple_values: Vec<String>,
    /// Included ranges.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ranges: Vec<StructuredRange>,
    /// Excluded ranges.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_ranges: Vec<StructuredRange>,
    /// Comparisons.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comparisons: Vec<StructuredCompare>,
    /// Pattern matches.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pattern_matchers: Vec<StructuredPattern>,
}

/// A range in structured form; bounds are inclusive unless stated otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct StructuredRange {
    /// Lower bound.
    pub lower: String,
    /// Upper bound.
    pub upper: String,
    /// Whether the lower bound matches.
    #[serde(default = "inclusive")]
    pub inclusive_lower: bool,
    /// Whether the upper bound matches.
    #[serde(default = "inclusive")]
    pub inclusive_upper: bool,
}

fn inclusive() -> bool {
    true
}

/// A comparison in structured form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct StructuredCompare {
    /// Comparison operator.
    pub operator: CompareOperator,
    /// Compared value.
    pub value: String,
}

/// A pattern match in structured form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct StructuredPattern {
    /// Match type.
    #[serde(rename = "type")]
    pub match_type: PatternMatchType,
    /// Pattern text, without wildcards.
    pub value: String,
    /// Ignore case when matching.
    #[serde(default)]
    pub case_insensitive: bool,
}

impl StructuredField {
    fn raw_values(&self) -> impl Iterator<Item = RawValue> + '_ {
        let singles = self.simple_values.iter().map(|view| RawValue::Single {
            view: view.clone(),
            excluded: false,
        });
        let excluded = self
            .excluded_simple_values
            .iter()
            .map(|view| RawValue::Single {
                view: view.clone(),
                excluded: true,
            });
        let ranges = self.ranges.iter().map(|r| r.raw(false));
        let excluded_ranges = self.excluded_ranges.iter().map(|r| r.raw(true));
        let comparisons = self.comparisons.iter().map(|c| RawValue::Compare {
            view: c.value.clone(),
            operator: c.operator,
        });
        let patterns = self.pattern_matchers.iter().map(|p| RawValue::Pattern {
            value: p.value.clone(),
            match_type: p.match_type,
            case_insensitive: p.case_insensitive,
        });

        singles
            .chain(excluded)
            .chain(ranges)
            .chain(excluded_ranges)
            .chain(comparisons)
            .chain(patterns)
    }
}

impl StructuredRange {
    fn raw(&self, excluded: bool) -> RawValue {
        RawValue::Range {
            lower: self.lower.clone(),
            upper: self.upper.clone(),
            inclusive_lower: self.inclusive_lower,
            inclusive_upper: self.inclusive_upper,
            excluded,
        }
    }
}

/// Builds conditions from the structured form.
#[derive(Debug, Clone, Default)]
pub struct StructuredInput {
    config: ProcessorConfig,
}

impl StructuredInput {
    /// Creates a processor with the given limits.
    pub fn new(config: ProcessorConfig) -> Self {
        Self { config }
    }

    /// Builds a condition from a structured root group.
    pub fn process(
        &self,
        input: &StructuredGroup,
        field_set: &Arc<FieldSet>,
    ) -> SearchResult<SearchCondition> {
        let mut scope = GroupScope::root();
        let root = self.build_group(input, field_set, &mut scope)?;
        debug!(
            fields = root.fields.len(),
            groups = root.groups.len(),
            values = root.count_values(),
            "Built search condition from structured input"
        );
        Ok(SearchCondition::new(Arc::clone(field_set), root))
    }

    /// Decodes JSON text and builds a condition from it.
    pub fn process_json(
        &self,
        json: &str,
        field_set: &Arc<FieldSet>,
    ) -> SearchResult<SearchCondition> {
        let input: StructuredGroup = serde_json::from_str(json)?;
        self.process(&input, field_set)
    }

    fn build_group(
        &self,
        input: &StructuredGroup,
        field_set: &FieldSet,
        scope: &mut GroupScope,
    ) -> SearchResult<ValuesGroup> {
        let mut group = ValuesGroup::new(input.logical);

        for (name, values) in &input.fields {
            let field = field_set
                .get(name)
                .ok_or_else(|| SemanticError::UnknownField {
                    field: name.clone(),
                })?;
            for raw in values.raw_values() {
                scope.add_value(&mut group, field, raw, &self.config)?;
            }
        }

        for (idx, child) in input.groups.iter().enumerate() {
            scope.check_groups(idx + 1, &self.config)?;
            let mut child_scope = scope.child(idx);
            child_scope.check_nesting(&self.config)?;
            let built = self.build_group(child, field_set, &mut child_scope)?;
            group.groups.push(built);
        }

        Ok(group)
    }
}
