//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use helios_search::SearchProcessor;
use helios_search::backends::sql::{DbType, SqlConditionGenerator, SqlDialect};
use helios_search::conversion::AgeDateConversion;
use helios_search::field::{FieldConfig, FieldSet, FieldType, NaturalIncrementer};
use helios_search::input::ProcessorConfig;
use helios_search::types::ValueKind;

/// A `users` field set covering every value kind.
///
/// - `id`: integer, ranges and comparisons, consecutive values merge
/// - `name`: text, pattern matches
/// - `age`: birthday searched by age or date
/// - `group`: integer, at most three values
/// - `created`: date, ranges
pub fn users() -> Arc<FieldSet> {
    let age = Arc::new(AgeDateConversion);
    Arc::new(
        FieldSet::builder("users")
            .add(
                FieldConfig::builder("id", FieldType::Integer)
                    .accept_ranges()
                    .accept_comparisons()
                    .incrementer(NaturalIncrementer)
                    .build(),
            )
            .add(
                FieldConfig::builder("name", FieldType::Text)
                    .accept_pattern_matches()
                    .build(),
            )
            .add(
                FieldConfig::builder("age", FieldType::Birthday)
                    .accept(ValueKind::Range)
                    .accept_comparisons()
                    .sql_conversion(age.clone())
                    .document_conversion(age)
                    .build(),
            )
            .add(
                FieldConfig::builder("group", FieldType::Integer)
                    .max_values(3)
                    .build(),
            )
            .add(
                FieldConfig::builder("created", FieldType::Date)
                    .accept_ranges()
                    .incrementer(NaturalIncrementer)
                    .build(),
            )
            .build()
            .unwrap(),
    )
}

pub fn processor() -> SearchProcessor {
    SearchProcessor::new(ProcessorConfig::default())
}

/// A SQL generator with every `users` field mapped.
pub fn sql_generator(dialect: SqlDialect) -> SqlConditionGenerator {
    let mut generator = SqlConditionGenerator::new(dialect);
    generator
        .set_field("id", "u.id", DbType::Integer)
        .set_field("name", "u.name", DbType::Text)
        .set_field("age", "u.birthday", DbType::Date)
        .set_field("group", "u.group_id", DbType::Integer)
        .set_field("created", "u.created", DbType::Date);
    generator
}
