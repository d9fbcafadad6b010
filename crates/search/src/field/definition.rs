//! Declarative field set definitions.
//!
//! A definition describes a field set and its backend mappings as data, so
//! it can be kept in a JSON file next to the schema it searches:
//!
//! ```json
//! {
//!   "name": "users",
//!   "fields": [
//!     { "name": "id", "type": "integer", "accept": ["single", "range"],
//!       "incrementer": "natural", "sql": [{ "column": "u.id" }],
//!       "document": [{ "property": "user_id" }] },
//!     { "name": "age", "type": "birthday", "accept": ["single", "comparison"],
//!       "conversion": { "type": "age-date" },
//!       "sql": [{ "column": "u.birthday", "db-type": "date" }] }
//!   ]
//! }
//! ```
//!
//! Unknown keys are rejected.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backends::elasticsearch::EsConditionGenerator;
use crate::backends::sql::{DbType, SqlConditionGenerator, SqlDialect};
use crate::conversion::{AgeDateConversion, CastConversion};
use crate::error::ConfigError;
use crate::types::ValueKind;

use super::comparator::{DateTimeIncrementer, NaturalIncrementer};
use super::config::FieldConfig;
use super::constraint::Constraint;
use super::field_set::FieldSet;
use super::field_type::FieldType;

/// A field set declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSetDefinition {
    /// Field set name.
    pub name: String,
    /// Declared fields.
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

/// Declaration of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FieldDefinition {
    /// Field name.
    pub name: String,
    /// Value type, `text` when omitted.
    #[serde(default, rename = "type")]
    pub field_type: FieldType,
    /// Accepted value kinds; single and excluded values when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accept: Vec<ValueKind>,
    /// Per-field value limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_values: Option<usize>,
    /// How consecutive values merge into ranges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incrementer: Option<IncrementerDefinition>,
    /// Smallest accepted value, in the field's textual form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    /// Largest accepted value, in the field's textual form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
    /// Longest accepted text, in characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Regular expression text values must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Backend conversion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion: Option<ConversionDefinition>,
    /// Column mappings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sql: Vec<SqlMappingDefinition>,
    /// Document property mappings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub document: Vec<DocumentMappingDefinition>,
}

/// How consecutive values of a field are detected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IncrementerDefinition {
    /// Integers step by one, dates by one day.
    Natural,
    /// Timestamps step by a duration such as `1s` or `1h`.
    Duration(String),
}

/// Backend conversion of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", deny_unknown_fields)]
pub enum ConversionDefinition {
    /// Search a date column by date or by age.
    AgeDate,
    /// Cast column and value to a SQL type.
    Cast {
        /// Target SQL type, e.g. `DECIMAL(10, 2)`.
        #[serde(rename = "sql-type")]
        sql_type: String,
    },
}

/// Column mapping of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct SqlMappingDefinition {
    /// Column expression, e.g. `u.id`.
    pub column: String,
    /// Defaults to the type matching the field type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_type: Option<DbType>,
}

/// Document property mapping of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentMappingDefinition {
    /// Property path in the document.
    pub property: String,
}

/// A locked field set together with its backend mappings.
#[derive(Debug, Clone)]
pub struct LoadedFieldSet {
    /// The locked field set.
    pub field_set: Arc<FieldSet>,
    sql: BTreeMap<String, Vec<(String, DbType)>>,
    document: BTreeMap<String, Vec<String>>,
}

impl LoadedFieldSet {
    /// A SQL generator with every declared column mapping.
    pub fn sql_generator(&self, dialect: SqlDialect) -> SqlConditionGenerator {
        let mut generator = SqlConditionGenerator::new(dialect);
        for (field, columns) in &self.sql {
            for (column, db_type) in columns {
                generator.set_field(field.as_str(), column.as_str(), *db_type);
            }
        }
        generator
    }

    /// A document generator with every declared property mapping.
    pub fn document_generator(&self) -> EsConditionGenerator {
        let mut generator = EsConditionGenerator::new();
        for (field, properties) in &self.document {
            for property in properties {
                generator.set_field(field.as_str(), property.as_str());
            }
        }
        generator
    }
}

impl FieldSetDefinition {
    /// Parses a JSON definition.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::InvalidDefinition {
            message: e.to_string(),
        })
    }

    /// Reads a JSON definition file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::InvalidDefinition {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::from_json(&json)
    }

    /// Builds and locks the field set.
    pub fn load(&self) -> Result<LoadedFieldSet, ConfigError> {
        let mut builder = FieldSet::builder(self.name.as_str());
        let mut sql = BTreeMap::new();
        let mut document = BTreeMap::new();

        for field in &self.fields {
            builder = builder.add(field.build()?);

            if !field.sql.is_empty() {
                let columns = field
                    .sql
                    .iter()
                    .map(|m| {
                        let db_type = m.db_type.unwrap_or_else(|| field.field_type.into());
                        (m.column.clone(), db_type)
                    })
                    .collect();
                sql.insert(field.name.clone(), columns);
            }
            if !field.document.is_empty() {
                let properties = field.document.iter().map(|m| m.property.clone()).collect();
                document.insert(field.name.clone(), properties);
            }
        }

        let field_set = builder.build()?;
        debug!(
            field_set = %self.name,
            fields = field_set.len(),
            "Loaded field set definition"
        );

        Ok(LoadedFieldSet {
            field_set: Arc::new(field_set),
            sql,
            document,
        })
    }
}

impl FieldDefinition {
    fn build(&self) -> Result<FieldConfig, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidDefinition {
            message: format!("field '{}': {}", self.name, message),
        };

        let mut builder = FieldConfig::builder(self.name.as_str(), self.field_type);
        if !self.accept.is_empty() {
            builder = builder.accept_only(self.accept.iter().copied());
        }
        if let Some(max) = self.max_values {
            builder = builder.max_values(max);
        }

        match &self.incrementer {
            Some(IncrementerDefinition::Natural) => builder = builder.incrementer(NaturalIncrementer),
            Some(IncrementerDefinition::Duration(text)) => {
                let step = humantime::parse_duration(text)
                    .map_err(|e| invalid(format!("invalid duration '{}': {}", text, e)))?;
                let step = chrono::Duration::from_std(step)
                    .map_err(|e| invalid(format!("invalid duration '{}': {}", text, e)))?;
                builder = builder.incrementer(DateTimeIncrementer::new(step));
            }
            None => {}
        }

        if let Some(min) = &self.min {
            let value = self.field_type.transform(min).map_err(invalid)?;
            builder = builder.constraint(Constraint::Min(value));
        }
        if let Some(max) = &self.max {
            let value = self.field_type.transform(max).map_err(invalid)?;
            builder = builder.constraint(Constraint::Max(value));
        }
        if let Some(length) = self.max_length {
            builder = builder.constraint(Constraint::MaxLength(length));
        }
        if let Some(pattern) = &self.pattern {
            let regex = Regex::new(pattern)
                .map_err(|e| invalid(format!("invalid pattern: {}", e)))?;
            builder = builder.constraint(Constraint::Matches(regex));
        }

        match &self.conversion {
            Some(ConversionDefinition::AgeDate) => {
                let conversion = Arc::new(AgeDateConversion);
                builder = builder
                    .sql_conversion(conversion.clone())
                    .document_conversion(conversion);
            }
            Some(ConversionDefinition::Cast { sql_type }) => {
                builder = builder.sql_conversion(Arc::new(CastConversion::new(sql_type.as_str())));
            }
            None => {}
        }

        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USERS: &str = r#"{
        "name": "users",
        "fields": [
            { "name": "id", "type": "integer", "accept": ["single", "range"],
              "incrementer": "natural", "max-values": 3,
              "sql": [{ "column": "u.id" }], "document": [{ "property": "user_id" }] },
            { "name": "age", "type": "birthday", "accept": ["single", "comparison"],
              "conversion": { "type": "age-date" },
              "sql": [{ "column": "u.birthday", "db-type": "date" }] },
            { "name": "seen", "type": "datetime", "incrementer": { "duration": "1s" } },
            { "name": "code", "min": "10", "max-length": 4, "pattern": "^[a-z]+$",
              "conversion": { "type": "cast", "sql-type": "VARCHAR(4)" } }
        ]
    }"#;

    #[test]
    fn test_load_definition() {
        let loaded = FieldSetDefinition::from_json(USERS).unwrap().load().unwrap();
        let field_set = &loaded.field_set;
        assert_eq!(field_set.name(), "users");
        assert_eq!(field_set.len(), 4);

        let id = field_set.get("id").unwrap();
        assert!(id.is_locked());
        assert!(id.accepts(ValueKind::Range));
        assert!(!id.accepts(ValueKind::Excluded));
        assert_eq!(id.max_values(), Some(3));
        assert!(id.incrementer().is_some());
        assert!(id.comparator().is_some());

        let age = field_set.get("age").unwrap();
        assert!(age.sql_conversion().is_some());
        assert!(age.document_conversion().is_some());

        let code = field_set.get("code").unwrap();
        assert_eq!(code.field_type(), FieldType::Text);
        assert_eq!(code.constraints().len(), 3);
    }

    #[test]
    fn test_generators_get_mappings() {
        let loaded = FieldSetDefinition::from_json(USERS).unwrap().load().unwrap();

        let sql = loaded.sql_generator(SqlDialect::MySql);
        assert_eq!(sql.mappings("id")[0].column, "u.id");
        assert_eq!(sql.mappings("id")[0].db_type, DbType::Integer);
        assert_eq!(sql.mappings("age")[0].db_type, DbType::Date);
        assert!(sql.mappings("seen").is_empty());

        let document = loaded.document_generator();
        assert_eq!(document.mappings("id"), ["user_id".to_string()]);
    }

    #[test]
    fn test_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(USERS.as_bytes()).unwrap();

        let definition = FieldSetDefinition::from_file(file.path()).unwrap();
        assert_eq!(definition.fields.len(), 4);

        let err = FieldSetDefinition::from_file(file.path().with_extension("missing")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = FieldSetDefinition::from_json(r#"{ "name": "x", "fields": [{ "name": "a", "sortable": true }] }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDefinition { .. }));
    }

    #[test]
    fn test_invalid_values() {
        let definition = FieldSetDefinition::from_json(
            r#"{ "name": "x", "fields": [{ "name": "n", "type": "integer", "min": "ten" }] }"#,
        )
        .unwrap();
        let err = definition.load().unwrap_err();
        assert!(err.to_string().contains("field 'n'"));

        let definition = FieldSetDefinition::from_json(
            r#"{ "name": "x", "fields": [{ "name": "a" }, { "name": "a" }] }"#,
        )
        .unwrap();
        assert_eq!(
            definition.load().unwrap_err(),
            ConfigError::DuplicateField {
                field: "a".to_string()
            }
        );
    }
}
