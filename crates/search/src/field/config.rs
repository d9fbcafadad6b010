//! Per-field configuration.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::backends::elasticsearch::DocumentConversion;
use crate::backends::sql::SqlConversion;
use crate::error::ConfigLockedError;
use crate::types::ValueKind;

use super::comparator::{Incrementer, NaturalComparator, ValueComparator};
use super::constraint::Constraint;
use super::field_type::FieldType;

/// Configuration of one searchable field.
///
/// A configuration is mutable until it is locked, which happens when it is
/// added to a [`FieldSet`](super::FieldSet). Every setter on a locked
/// configuration fails with [`ConfigLockedError`].
#[derive(Debug, Clone)]
pub struct FieldConfig {
    name: String,
    field_type: FieldType,
    accepted: BTreeSet<ValueKind>,
    comparator: Option<Arc<dyn ValueComparator>>,
    incrementer: Option<Arc<dyn Incrementer>>,
    max_values: Option<usize>,
    constraints: Vec<Constraint>,
    sql_conversion: Option<Arc<dyn SqlConversion>>,
    document_conversion: Option<Arc<dyn DocumentConversion>>,
    locked: bool,
}

impl FieldConfig {
    /// Creates an unlocked configuration accepting single and excluded values.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            accepted: [ValueKind::Single, ValueKind::Excluded].into_iter().collect(),
            comparator: None,
            incrementer: None,
            max_values: None,
            constraints: Vec::new(),
            sql_conversion: None,
            document_conversion: None,
            locked: false,
        }
    }

    /// Starts building a configuration.
    pub fn builder(name: impl Into<String>, field_type: FieldType) -> FieldConfigBuilder {
        FieldConfigBuilder {
            config: Self::new(name, field_type),
        }
    }

    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value type.
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Returns true if the field accepts values of the given kind.
    pub fn accepts(&self, kind: ValueKind) -> bool {
        self.accepted.contains(&kind)
    }

    /// Accepted value kinds.
    pub fn accepted_kinds(&self) -> impl Iterator<Item = ValueKind> + '_ {
        self.accepted.iter().copied()
    }

    /// Comparator used to order values, if any.
    pub fn comparator(&self) -> Option<&dyn ValueComparator> {
        self.comparator.as_deref()
    }

    /// Incrementer used to merge consecutive values, if any.
    pub fn incrementer(&self) -> Option<&dyn Incrementer> {
        self.incrementer.as_deref()
    }

    /// Per-field value limit, overriding the processor default.
    pub fn max_values(&self) -> Option<usize> {
        self.max_values
    }

    /// Value constraints checked by the validator.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// SQL conversion, if any.
    pub fn sql_conversion(&self) -> Option<&Arc<dyn SqlConversion>> {
        self.sql_conversion.as_ref()
    }

    /// Document conversion, if any.
    pub fn document_conversion(&self) -> Option<&Arc<dyn DocumentConversion>> {
        self.document_conversion.as_ref()
    }

    /// Returns true once the field was added to a field set.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Locks the configuration; later setters fail.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    fn ensure_unlocked(&self) -> Result<(), ConfigLockedError> {
        if self.locked {
            return Err(ConfigLockedError {
                field: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Replaces the accepted value kinds.
    pub fn set_accepted(
        &mut self,
        kinds: impl IntoIterator<Item = ValueKind>,
    ) -> Result<(), ConfigLockedError> {
        self.ensure_unlocked()?;
        self.accepted = kinds.into_iter().collect();
        Ok(())
    }

    /// Replaces the comparator.
    pub fn set_comparator(
        &mut self,
        comparator: Arc<dyn ValueComparator>,
    ) -> Result<(), ConfigLockedError> {
        self.ensure_unlocked()?;
        self.comparator = Some(comparator);
        Ok(())
    }

    /// Replaces the incrementer.
    pub fn set_incrementer(
        &mut self,
        incrementer: Arc<dyn Incrementer>,
    ) -> Result<(), ConfigLockedError> {
        self.ensure_unlocked()?;
        self.incrementer = Some(incrementer);
        Ok(())
    }

    /// Sets the per-field value limit.
    pub fn set_max_values(&mut self, max: usize) -> Result<(), ConfigLockedError> {
        self.ensure_unlocked()?;
        self.max_values = Some(max);
        Ok(())
    }

    /// Adds a value constraint.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<(), ConfigLockedError> {
        self.ensure_unlocked()?;
        self.constraints.push(constraint);
        Ok(())
    }

    /// Sets the SQL conversion.
    pub fn set_sql_conversion(
        &mut self,
        conversion: Arc<dyn SqlConversion>,
    ) -> Result<(), ConfigLockedError> {
        self.ensure_unlocked()?;
        self.sql_conversion = Some(conversion);
        Ok(())
    }

    /// Sets the document conversion.
    pub fn set_document_conversion(
        &mut self,
        conversion: Arc<dyn DocumentConversion>,
    ) -> Result<(), ConfigLockedError> {
        self.ensure_unlocked()?;
        self.document_conversion = Some(conversion);
        Ok(())
    }
}

/// Builder for [`FieldConfig`].
///
/// Accepting ranges or comparisons on an orderable type installs a
/// [`NaturalComparator`] unless another comparator is given.
#[derive(Debug)]
pub struct FieldConfigBuilder {
    config: FieldConfig,
}

impl FieldConfigBuilder {
    /// Adds an accepted value kind.
    pub fn accept(mut self, kind: ValueKind) -> Self {
        self.config.accepted.insert(kind);
        self
    }

    /// Replaces the accepted value kinds.
    pub fn accept_only(mut self, kinds: impl IntoIterator<Item = ValueKind>) -> Self {
        self.config.accepted = kinds.into_iter().collect();
        self
    }

    /// Accepts included and excluded ranges.
    pub fn accept_ranges(self) -> Self {
        self.accept(ValueKind::Range).accept(ValueKind::ExcludedRange)
    }

    /// Accepts comparisons.
    pub fn accept_comparisons(self) -> Self {
        self.accept(ValueKind::Comparison)
    }

    /// Accepts pattern matches.
    pub fn accept_pattern_matches(self) -> Self {
        self.accept(ValueKind::PatternMatch)
    }

    /// Sets the comparator.
    pub fn comparator(mut self, comparator: impl ValueComparator + 'static) -> Self {
        self.config.comparator = Some(Arc::new(comparator));
        self
    }

    /// Sets the incrementer.
    pub fn incrementer(mut self, incrementer: impl Incrementer + 'static) -> Self {
        self.config.incrementer = Some(Arc::new(incrementer));
        self
    }

    /// Sets the per-field value limit.
    pub fn max_values(mut self, max: usize) -> Self {
        self.config.max_values = Some(max);
        self
    }

    /// Adds a value constraint.
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.config.constraints.push(constraint);
        self
    }

    /// Sets the SQL conversion.
    pub fn sql_conversion(mut self, conversion: Arc<dyn SqlConversion>) -> Self {
        self.config.sql_conversion = Some(conversion);
        self
    }

    /// Sets the document conversion.
    pub fn document_conversion(mut self, conversion: Arc<dyn DocumentConversion>) -> Self {
        self.config.document_conversion = Some(conversion);
        self
    }

    /// Finishes the (still unlocked) configuration.
    pub fn build(mut self) -> FieldConfig {
        let needs_order = self.config.accepts(ValueKind::Range)
            || self.config.accepts(ValueKind::ExcludedRange)
            || self.config.accepts(ValueKind::Comparison);
        if needs_order && self.config.comparator.is_none() && self.config.field_type.is_orderable()
        {
            self.config.comparator = Some(Arc::new(NaturalComparator));
        }
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::NaturalIncrementer;

    #[test]
    fn test_builder_defaults() {
        let config = FieldConfig::builder("name", FieldType::Text).build();
        assert!(config.accepts(ValueKind::Single));
        assert!(config.accepts(ValueKind::Excluded));
        assert!(!config.accepts(ValueKind::Range));
        assert!(config.comparator().is_none());
        assert!(!config.is_locked());
    }

    #[test]
    fn test_ranges_install_comparator() {
        let config = FieldConfig::builder("id", FieldType::Integer)
            .accept_ranges()
            .incrementer(NaturalIncrementer)
            .build();
        assert!(config.comparator().is_some());
        assert!(config.incrementer().is_some());
        assert!(config.accepts(ValueKind::ExcludedRange));
    }

    #[test]
    fn test_boolean_gets_no_comparator() {
        let config = FieldConfig::builder("active", FieldType::Boolean)
            .accept_comparisons()
            .build();
        assert!(config.comparator().is_none());
    }

    #[test]
    fn test_locked_config_rejects_changes() {
        let mut config = FieldConfig::new("id", FieldType::Integer);
        config.set_max_values(5).unwrap();
        config.lock();

        let err = config.set_max_values(10).unwrap_err();
        assert_eq!(err.field, "id");
        assert_eq!(config.max_values(), Some(5));
        assert!(config.set_accepted([ValueKind::Range]).is_err());
        assert!(config.add_constraint(Constraint::MaxLength(3)).is_err());
    }
}
