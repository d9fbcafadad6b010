//! Processing facade: input, optimization and generation in one call.

use std::sync::Arc;

use tracing::debug;

use crate::backends::{CompiledFragment, ConditionGenerator};
use crate::error::{SearchError, SearchResult};
use crate::field::FieldSet;
use crate::input::{ProcessorConfig, StringQueryInput, StructuredGroup, StructuredInput};
use crate::optimizer::ConditionOptimizerChain;
use crate::types::SearchCondition;

/// Parses user input and runs the optimizer chain over the result.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use helios_search::SearchProcessor;
/// use helios_search::field::{FieldConfig, FieldSet, FieldType, NaturalIncrementer};
///
/// let fields = Arc::new(
///     FieldSet::builder("users")
///         .add(
///             FieldConfig::builder("id", FieldType::Integer)
///                 .accept_ranges()
///                 .incrementer(NaturalIncrementer)
///                 .build(),
///         )
///         .build()
///         .unwrap(),
/// );
///
/// let condition = SearchProcessor::default()
///     .process_strict("id: 3, 1, 2, 7", &fields)
///     .unwrap();
/// let bag = condition.values_group().field("id").unwrap();
/// assert_eq!(bag.ranges.len(), 1);
/// assert_eq!(bag.simple_values.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SearchProcessor {
    config: ProcessorConfig,
    optimizers: ConditionOptimizerChain,
}

impl SearchProcessor {
    /// Creates a processor with the default optimizer chain.
    pub fn new(config: ProcessorConfig) -> Self {
        Self {
            config,
            optimizers: ConditionOptimizerChain::default(),
        }
    }

    /// Replaces the optimizer chain.
    pub fn with_optimizers(mut self, optimizers: ConditionOptimizerChain) -> Self {
        self.optimizers = optimizers;
        self
    }

    /// Limits used by this processor.
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Parses and optimizes a textual query.
    ///
    /// Validation messages are left on the returned condition; check
    /// [`SearchCondition::has_errors`] before compiling it.
    pub fn process(&self, input: &str, field_set: &Arc<FieldSet>) -> SearchResult<SearchCondition> {
        let mut condition = StringQueryInput::new(self.config).process(input, field_set)?;
        self.optimize(&mut condition);
        Ok(condition)
    }

    /// Builds and optimizes a condition from the structured form.
    pub fn process_structured(
        &self,
        input: &StructuredGroup,
        field_set: &Arc<FieldSet>,
    ) -> SearchResult<SearchCondition> {
        let mut condition = StructuredInput::new(self.config).process(input, field_set)?;
        self.optimize(&mut condition);
        Ok(condition)
    }

    /// Like [`process`](Self::process), but fails with
    /// [`SearchError::InvalidCondition`] carrying every validation message.
    pub fn process_strict(
        &self,
        input: &str,
        field_set: &Arc<FieldSet>,
    ) -> SearchResult<SearchCondition> {
        strict(self.process(input, field_set)?)
    }

    /// Processes a textual query and compiles it with `generator`.
    pub fn compile(
        &self,
        input: &str,
        field_set: &Arc<FieldSet>,
        generator: &dyn ConditionGenerator,
    ) -> SearchResult<CompiledFragment> {
        let condition = self.process_strict(input, field_set)?;
        Ok(generator.compile(&condition)?)
    }

    /// Runs the optimizer chain.
    pub fn optimize(&self, condition: &mut SearchCondition) {
        self.optimizers.apply(condition);
        debug!(
            field_set = condition.field_set().name(),
            values = condition.values_group().count_values(),
            has_errors = condition.has_errors(),
            "Processed search condition"
        );
    }
}

fn strict(condition: SearchCondition) -> SearchResult<SearchCondition> {
    if condition.has_errors() {
        return Err(SearchError::InvalidCondition {
            errors: condition.errors(),
        });
    }
    Ok(condition)
}
