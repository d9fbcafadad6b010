//! Searchable field declarations.
//!
//! A [`FieldSet`] is the closed set of fields a condition may refer to. Each
//! [`FieldConfig`] declares the field's [`FieldType`], which value kinds it
//! accepts, how its values are ordered and incremented, and optional backend
//! conversions.

mod comparator;
mod config;
mod constraint;
mod definition;
mod field_set;
mod field_type;

pub use comparator::{
    DateTimeIncrementer, Incrementer, NaturalComparator, NaturalIncrementer, ValueComparator,
};
pub use config::{FieldConfig, FieldConfigBuilder};
pub use constraint::Constraint;
pub use definition::{
    ConversionDefinition, DocumentMappingDefinition, FieldDefinition, FieldSetDefinition,
    IncrementerDefinition, LoadedFieldSet, SqlMappingDefinition,
};
pub use field_set::{FieldSet, FieldSetBuilder};
pub use field_type::FieldType;
