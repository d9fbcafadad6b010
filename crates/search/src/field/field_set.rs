//! The closed set of searchable fields of one search context.

use std::collections::HashMap;

use crate::error::ConfigError;

use crate::types::ValueKind;

use super::config::FieldConfig;
use super::field_type::FieldType;

/// A named, ordered collection of locked field configurations.
#[derive(Debug, Clone)]
pub struct FieldSet {
    name: String,
    fields: Vec<FieldConfig>,
    index: HashMap<String, usize>,
}

impl FieldSet {
    /// Starts building a field set.
    pub fn builder(name: impl Into<String>) -> FieldSetBuilder {
        FieldSetBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// The field set name; part of every cache fingerprint.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldConfig> {
        self.index.get(name).map(|&idx| &self.fields[idx])
    }

    /// Returns true if a field with this name exists.
    pub fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldConfig> {
        self.fields.iter()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the set has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Builder for [`FieldSet`].
#[derive(Debug)]
pub struct FieldSetBuilder {
    name: String,
    fields: Vec<FieldConfig>,
}

impl FieldSetBuilder {
    /// Adds a field.
    pub fn add(mut self, field: FieldConfig) -> Self {
        self.fields.push(field);
        self
    }

    /// Locks every field and builds the set.
    pub fn build(self) -> Result<FieldSet, ConfigError> {
        let mut index = HashMap::with_capacity(self.fields.len());
        let mut fields = self.fields;

        for (idx, field) in fields.iter_mut().enumerate() {
            if index.insert(field.name().to_string(), idx).is_some() {
                return Err(ConfigError::DuplicateField {
                    field: field.name().to_string(),
                });
            }
            // LIKE and regex predicates only make sense on character data.
            if field.accepts(ValueKind::PatternMatch) && field.field_type() != FieldType::Text {
                return Err(ConfigError::PatternsOnNonText {
                    field: field.name().to_string(),
                    field_type: field.field_type(),
                });
            }
            field.lock();
        }

        Ok(FieldSet {
            name: self.name,
            fields,
            index,
        })
    }
}
