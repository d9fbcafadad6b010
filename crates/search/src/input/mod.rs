//! Input processors turning user input into a [`SearchCondition`].
//!
//! - [`StringQueryInput`] - the compact textual query syntax
//! - [`StructuredInput`] - the array/object form (or its JSON text)
//!
//! Both enforce the same limits from [`ProcessorConfig`] and record value
//! transformation failures as validation messages on the condition.

mod lexer;
mod parser;
mod structured;
mod values;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::SearchResult;
use crate::field::FieldSet;
use crate::types::SearchCondition;

pub use lexer::{Lexer, Token, TokenKind, tokenize};
pub use structured::{
    StructuredCompare, StructuredField, StructuredGroup, StructuredInput, StructuredPattern,
    StructuredRange,
};

/// Structural limits applied while building a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Maximum group depth; the root group is level 0.
    pub max_nesting_level: usize,
    /// Maximum number of child groups per group.
    pub max_groups: usize,
    /// Default maximum number of values per field and group.
    pub max_values: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_nesting_level: 100,
            max_groups: 100,
            max_values: 10_000,
        }
    }
}

/// Builds conditions from the textual query syntax.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use helios_search::field::{FieldConfig, FieldSet, FieldType};
/// use helios_search::input::{ProcessorConfig, StringQueryInput};
///
/// let fields = Arc::new(
///     FieldSet::builder("users")
///         .add(FieldConfig::builder("id", FieldType::Integer).accept_ranges().build())
///         .build()
///         .unwrap(),
/// );
/// let input = StringQueryInput::new(ProcessorConfig::default());
/// let condition = input.process("id: 1, 5-10", &fields).unwrap();
/// assert_eq!(condition.values_group().count_values(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StringQueryInput {
    config: ProcessorConfig,
}

impl StringQueryInput {
    /// Creates a processor with the given limits.
    pub fn new(config: ProcessorConfig) -> Self {
        Self { config }
    }

    /// Parses `input` against `field_set`.
    pub fn process(&self, input: &str, field_set: &Arc<FieldSet>) -> SearchResult<SearchCondition> {
        let root = parser::Parser::new(input, field_set, &self.config).parse()?;
        Ok(SearchCondition::new(Arc::clone(field_set), root))
    }
}
